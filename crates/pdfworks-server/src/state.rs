// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared handler state, built once at startup.

use std::sync::Arc;

use pdfworks_core::{Result, ServerConfig};
use pdfworks_document::{SofficeRenderer, WordToPdf};
use pdfworks_security::{ConnectionPool, CredentialStore, PasswordHasher, TokenSigner};
use tracing::info;

/// Everything a handler needs. Cloned per request; all fields are cheap
/// handles.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub signer: Arc<TokenSigner>,
    pub word_to_pdf: WordToPdf,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the credential database and wire up the production backends.
    pub async fn open(config: ServerConfig) -> Result<Self> {
        let pool = ConnectionPool::open(&config.database_path, config.db_pool_size)?;
        let credentials = CredentialStore::new(pool, PasswordHasher::default()).await?;
        let signer =
            TokenSigner::with_ttl_hours(config.jwt_secret.as_bytes(), config.token_ttl_hours);

        std::fs::create_dir_all(&config.work_dir)?;
        let renderer =
            SofficeRenderer::new(&config.soffice_path).with_timeout(config.conversion_timeout());
        let word_to_pdf = WordToPdf::new(Arc::new(renderer), &config.work_dir);

        info!(
            database = %config.database_path.display(),
            pool_size = config.db_pool_size,
            renderer = %config.soffice_path.display(),
            "application state ready"
        );
        Ok(Self::new(credentials, signer, word_to_pdf, config))
    }

    pub fn new(
        credentials: CredentialStore,
        signer: TokenSigner,
        word_to_pdf: WordToPdf,
        config: ServerConfig,
    ) -> Self {
        Self {
            credentials,
            signer: Arc::new(signer),
            word_to_pdf,
            config: Arc::new(config),
        }
    }
}
