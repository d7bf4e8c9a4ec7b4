// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfworks.
//
// Library crates raise these; only the HTTP layer turns them into status
// codes.

use thiserror::Error;

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is missing")]
    Missing,

    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid")]
    Invalid,
}

/// Top-level error type for all pdfworks operations.
#[derive(Debug, Error)]
pub enum PdfworksError {
    // -- Request validation --
    #[error("{0}")]
    Validation(String),

    #[error("Invalid page range '{token}': {reason}")]
    Range { token: String, reason: String },

    #[error("No valid pages selected to split.")]
    EmptySelection,

    // -- Authentication --
    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("{0}")]
    Conflict(String),

    // -- Document processing --
    #[error("invalid document: {0}")]
    Format(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PdfworksError {
    /// Shorthand for a page-range error on `token`.
    pub fn range(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Range {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller is at fault (as opposed to the server or a tool).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Range { .. }
                | Self::EmptySelection
                | Self::Auth(_)
                | Self::Token(_)
                | Self::Conflict(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfworksError>;
