// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route table and middleware.
//
//   GET  /api/health        (open)
//   POST /api/register      (open)
//   POST /api/login         (open)
//   POST /api/merge         multipart files, files[]
//   POST /api/split         multipart file + ranges
//   POST /api/pdf-to-word   multipart file
//   POST /api/word-to-pdf   multipart file
//   POST /api/compress      multipart file + level
//   POST /api/unlock        multipart file + password
//   POST /api/protect       multipart file + password

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/merge", post(handlers::merge))
        .route("/api/split", post(handlers::split))
        .route("/api/pdf-to-word", post(handlers::pdf_to_word))
        .route("/api/word-to-pdf", post(handlers::word_to_pdf))
        .route("/api/compress", post(handlers::compress_pdf))
        .route("/api/unlock", post(handlers::unlock_pdf))
        .route("/api/protect", post(handlers::protect_pdf))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Allow only the configured front-end origin.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!(%frontend_url, error = %e, "unusable FRONTEND_URL; cross-origin requests disabled");
            layer
        }
    }
}
