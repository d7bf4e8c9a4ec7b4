// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart form collection. The whole form is read into memory; the body
// size is capped by the router's `DefaultBodyLimit`.

use std::collections::HashMap;

use axum::extract::Multipart;
use pdfworks_core::PdfworksError;
use tracing::debug;

use crate::error::ApiError;

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A fully read multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, Vec<UploadedFile>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of `multipart`. Parts with a filename are files;
    /// the rest are text fields. `files[]` is stored as `files`.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().trim_end_matches("[]").to_string();
            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let bytes = field.bytes().await?.to_vec();
                    debug!(field = %name, %filename, bytes_len = bytes.len(), "file part received");
                    form.files
                        .entry(name)
                        .or_default()
                        .push(UploadedFile { filename, bytes });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// The single file uploaded as `name`.
    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, ApiError> {
        self.files
            .remove(name)
            .and_then(|files| files.into_iter().next())
            .filter(|file| !file.bytes.is_empty() || !file.filename.is_empty())
            .ok_or_else(|| PdfworksError::Validation("No file part".into()).into())
    }

    /// Every file uploaded as `name`, in upload order.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    /// A text field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field that must be present.
    pub fn require_field(&self, name: &str, message: &str) -> Result<&str, ApiError> {
        self.field(name)
            .ok_or_else(|| PdfworksError::Validation(message.to_owned()).into())
    }
}
