// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error mapping. The only place a `PdfworksError` becomes a status
// code; every error body is `{"error": "..."}`.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfworks_core::PdfworksError;
use serde::Serialize;
use tracing::{error, warn};

/// Error type returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub PdfworksError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PdfworksError::Validation(_)
            | PdfworksError::Range { .. }
            | PdfworksError::EmptySelection => StatusCode::BAD_REQUEST,
            PdfworksError::Auth(_) | PdfworksError::Token(_) => StatusCode::UNAUTHORIZED,
            PdfworksError::Conflict(_) => StatusCode::CONFLICT,
            PdfworksError::Format(_)
            | PdfworksError::Conversion(_)
            | PdfworksError::Database(_)
            | PdfworksError::Io(_)
            | PdfworksError::Serialization(_)
            | PdfworksError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PdfworksError> for ApiError {
    fn from(err: PdfworksError) -> Self {
        Self(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(PdfworksError::Validation(format!("Malformed upload: {}", err.body_text())))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self(PdfworksError::Validation(err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
