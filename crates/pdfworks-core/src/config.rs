// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server configuration, read from the process environment at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PdfworksError, Result};

/// Runtime settings for the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: String,
    /// The single front-end origin allowed by CORS.
    pub frontend_url: String,
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    /// Path of the SQLite credential database.
    pub database_path: PathBuf,
    /// Maximum number of pooled database connections.
    pub db_pool_size: usize,
    /// Upper bound on blocking worker threads used for transforms.
    pub worker_threads: usize,
    /// Office renderer binary used for Word → PDF.
    pub soffice_path: PathBuf,
    /// Wall-clock limit for one renderer invocation.
    pub conversion_timeout_secs: u64,
    /// Parent directory for per-job scratch directories.
    pub work_dir: PathBuf,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: String::new(),
            database_path: PathBuf::from("pdfworks.db"),
            db_pool_size: 10,
            worker_threads: 8,
            soffice_path: PathBuf::from("soffice"),
            conversion_timeout_secs: 120,
            work_dir: std::env::temp_dir(),
            max_upload_bytes: 50 * 1024 * 1024,
            token_ttl_hours: 24,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset. `JWT_SECRET_KEY` is mandatory.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("PDFWORKS_BIND") {
            config.bind_addr = v;
        }
        if let Some(v) = lookup("FRONTEND_URL") {
            config.frontend_url = v;
        }
        match lookup("JWT_SECRET_KEY") {
            Some(v) if !v.is_empty() => config.jwt_secret = v,
            _ => {
                return Err(PdfworksError::Validation(
                    "JWT_SECRET_KEY must be set".into(),
                ));
            }
        }
        if let Some(v) = lookup("DATABASE_URL") {
            config.database_path = PathBuf::from(v.trim_start_matches("sqlite://"));
        }
        if let Some(v) = lookup("PDFWORKS_SOFFICE") {
            config.soffice_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PDFWORKS_WORK_DIR") {
            config.work_dir = PathBuf::from(v);
        }

        config.db_pool_size = parse_or(&lookup, "PDFWORKS_DB_POOL_SIZE", config.db_pool_size)?.max(1);
        config.worker_threads = parse_or(&lookup, "PDFWORKS_WORKERS", config.worker_threads)?.max(1);
        config.conversion_timeout_secs = parse_or(
            &lookup,
            "PDFWORKS_CONVERSION_TIMEOUT_SECS",
            config.conversion_timeout_secs,
        )?;
        config.token_ttl_hours = parse_or(&lookup, "PDFWORKS_TOKEN_TTL_HOURS", config.token_ttl_hours)?;

        let upload_mb: usize = parse_or(
            &lookup,
            "PDFWORKS_MAX_UPLOAD_MB",
            config.max_upload_bytes / (1024 * 1024),
        )?;
        config.max_upload_bytes = upload_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            PdfworksError::Validation(format!(
                "PDFWORKS_MAX_UPLOAD_MB: {upload_mb} MiB does not fit in memory"
            ))
        })?;

        Ok(config)
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PdfworksError::Validation(format!("{key}: cannot parse '{raw}'"))),
    }
}
