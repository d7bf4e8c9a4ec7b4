// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route handlers. Each one unpacks its request, calls exactly one
// primitive (on the blocking pool for document work) and wraps the result.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use pdfworks_core::{
    CompressionLevel, DocumentKind, PdfworksError, TransformOutput, replace_extension,
    sanitize_filename,
};
use pdfworks_document::{
    compress, merge as merge_pdfs, pdf_to_docx, protect, split as split_pdf, unlock,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::UploadForm;

type ApiResult<T> = Result<T, ApiError>;

/// Body of `/api/register` and `/api/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn parts(&self) -> (&str, &str) {
        (
            self.email.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    let (email, password) = request.parts();
    state.credentials.register(email, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created successfully" })),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    let (email, password) = request.parts();
    let user = state.credentials.verify(email, password).await?;
    let token = state.signer.issue(&user.user_id.to_string())?;

    info!(user_id = user.user_id, "login succeeded");
    Ok(Json(json!({ "token": token })).into_response())
}

// ---------------------------------------------------------------------------
// Document transforms
// ---------------------------------------------------------------------------

pub async fn merge(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let files = form.take_files("files");
    if files.is_empty() {
        return Err(PdfworksError::Validation("No files part".into()).into());
    }
    if files.len() < 2 {
        return Err(PdfworksError::Validation(
            "Please upload at least two files to merge".into(),
        )
        .into());
    }

    info!(user_id = %user.user_id, files = files.len(), "merge requested");
    let output = blocking(move || {
        let inputs: Vec<&[u8]> = files.iter().map(|file| file.bytes.as_slice()).collect();
        merge_pdfs(&inputs).map(|bytes| TransformOutput::pdf(bytes, "merged.pdf"))
    })
    .await?;
    Ok(attachment(output))
}

pub async fn split(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let ranges = form
        .require_field("ranges", "No page ranges provided")?
        .to_owned();

    info!(user_id = %user.user_id, %ranges, "split requested");
    let output = blocking(move || {
        split_pdf(&file.bytes, &ranges).map(|bytes| TransformOutput::pdf(bytes, "split.pdf"))
    })
    .await?;
    Ok(attachment(output))
}

pub async fn pdf_to_word(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;

    info!(user_id = %user.user_id, filename = %file.filename, "PDF → Word requested");
    let output = blocking(move || {
        let bytes = pdf_to_docx(&file.bytes)?;
        Ok(TransformOutput {
            bytes,
            filename: replace_extension(&file.filename, DocumentKind::Docx.extension()),
            kind: DocumentKind::Docx,
        })
    })
    .await?;
    Ok(attachment(output))
}

pub async fn word_to_pdf(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;

    info!(user_id = %user.user_id, filename = %file.filename, "Word → PDF requested");
    let converter = state.word_to_pdf.clone();
    let output = blocking(move || converter.convert(&file.bytes, &file.filename)).await?;
    Ok(attachment(output))
}

pub async fn compress_pdf(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let level: CompressionLevel = form.field("level").unwrap_or_default().parse()?;

    info!(user_id = %user.user_id, level = level.as_str(), "compress requested");
    let output = blocking(move || {
        compress(&file.bytes, level).map(|bytes| TransformOutput::pdf(bytes, "compressed.pdf"))
    })
    .await?;
    Ok(attachment(output))
}

pub async fn unlock_pdf(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let password = form
        .require_field("password", "Password is required")?
        .to_owned();

    info!(user_id = %user.user_id, "unlock requested");
    let output = blocking(move || {
        unlock(&file.bytes, &password).map(|bytes| TransformOutput::pdf(bytes, "unlocked.pdf"))
    })
    .await?;
    Ok(attachment(output))
}

pub async fn protect_pdf(user: AuthenticatedUser, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let password = form
        .require_field("password", "Password is required")?
        .to_owned();
    if password.is_empty() {
        return Err(PdfworksError::Validation("Password is required".into()).into());
    }

    info!(user_id = %user.user_id, "protect requested");
    let output = blocking(move || {
        protect(&file.bytes, &password).map(|bytes| TransformOutput::pdf(bytes, "protected.pdf"))
    })
    .await?;
    Ok(attachment(output))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a document primitive on the blocking pool.
async fn blocking<F>(task: F) -> ApiResult<TransformOutput>
where
    F: FnOnce() -> pdfworks_core::Result<TransformOutput> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| PdfworksError::Internal(format!("transform task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Raw bytes as a download.
fn attachment(output: TransformOutput) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&output.filename)
    );
    info!(
        filename = %output.filename,
        output_bytes = output.bytes.len(),
        "sending attachment"
    );
    (
        [
            (header::CONTENT_TYPE, output.kind.mime_type().to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response()
}
