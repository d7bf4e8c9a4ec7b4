// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfworks-server — HTTP front end for the pdfworks document transforms.
//
// Maps each route to one primitive from `pdfworks-document`, gates the
// document routes behind a bearer token from `pdfworks-security`, and is the
// only layer that turns errors into HTTP status codes.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod upload;

pub use auth::{AuthenticatedUser, authenticate};
pub use error::ApiError;
pub use router::router;
pub use server::ApiServer;
pub use state::AppState;
