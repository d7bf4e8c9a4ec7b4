// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pdfworks transformation pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PdfworksError;

/// Unique identifier for a conversion job. Used for log correlation only;
/// jobs have no persistent identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document formats accepted or produced by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// Legacy binary Word document (input only).
    Doc,
}

impl DocumentKind {
    /// MIME type for the `Content-Type` response header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Doc => "application/msword",
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
        }
    }

    /// Infer document kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    /// Infer document kind from a filename's extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// How hard `compress` tries to shrink a document.
///
/// Each level applies every optimisation of the levels below it, so output
/// size never grows as the level increases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Flate-compress uncompressed streams.
    Low,
    /// Also drop unreachable objects and empty streams, then renumber.
    #[default]
    Medium,
    /// Also strip thumbnails and application private data.
    High,
}

impl CompressionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = PdfworksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "" | "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PdfworksError::Validation(format!(
                "Unknown compression level '{other}' (expected low, medium or high)"
            ))),
        }
    }
}

/// The result of one transform, ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    /// Attachment filename presented to the client.
    pub filename: String,
    pub kind: DocumentKind,
}

impl TransformOutput {
    pub fn pdf(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            kind: DocumentKind::Pdf,
        }
    }
}

/// Reduce an uploaded filename to a safe bare name: no directory
/// components, quotes or control characters.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    base.chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Replace (or add) the extension of `filename`, falling back to
/// `document.<ext>` when nothing usable is left.
pub fn replace_extension(filename: &str, ext: &str) -> String {
    let clean = sanitize_filename(filename);
    let stem = match clean.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => clean.as_str(),
    };
    if stem.is_empty() {
        format!("document.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}
