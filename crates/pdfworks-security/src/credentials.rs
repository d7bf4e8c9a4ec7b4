// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Credential store — user accounts in SQLite.
//
// Schema:
//   users(
//     user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
//     email         TEXT    NOT NULL UNIQUE,
//     password_hash TEXT    NOT NULL,   -- see `password` module
//     created_at    TEXT    NOT NULL    -- RFC 3339
//   )

use chrono::Utc;
use pdfworks_core::error::{PdfworksError, Result};
use rusqlite::{ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::password::PasswordHasher;
use crate::pool::{ConnectionPool, PooledConnection, db_err};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    created_at    TEXT    NOT NULL
);";

/// Shown for unknown emails and wrong passwords alike.
const INVALID_LOGIN: &str = "Invalid email or password";

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredential {
    pub user_id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// Registers users and checks their credentials.
///
/// Every operation checks a connection out of the pool, runs on the
/// blocking thread pool and hands the connection back when it finishes.
#[derive(Clone)]
pub struct CredentialStore {
    pool: ConnectionPool,
    hasher: PasswordHasher,
}

impl CredentialStore {
    /// Wrap `pool` and make sure the `users` table exists.
    pub async fn new(pool: ConnectionPool, hasher: PasswordHasher) -> Result<Self> {
        let conn = pool.get().await?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        drop(conn);
        debug!("credential store ready");
        Ok(Self { pool, hasher })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Create an account. Returns the new user id.
    ///
    /// Empty email or password is a `Validation` error; an email that is
    /// already registered is a `Conflict`.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<i64> {
        let email = require_credentials(email, password)?;
        let password = password.to_owned();
        let hasher = self.hasher;
        let conn = self.pool.get().await?;

        let user_id = run_blocking(move || {
            let hash = hasher.hash(&password)?;
            insert_user(&conn, &email, &hash)
        })
        .await?;

        info!(user_id, "user registered");
        Ok(user_id)
    }

    /// Check `password` for `email` and return the account.
    ///
    /// Unknown emails and wrong passwords both yield the same `Auth` error.
    #[instrument(skip(self, password))]
    pub async fn verify(&self, email: &str, password: &str) -> Result<UserCredential> {
        let email = require_credentials(email, password)?;
        let password = password.to_owned();
        let hasher = self.hasher;
        let conn = self.pool.get().await?;

        run_blocking(move || {
            let user = find_by_email(&conn, &email)?;
            drop(conn);
            match user {
                Some(user) if hasher.verify(&password, &user.password_hash) => Ok(user),
                Some(_) => {
                    warn!("login rejected: wrong password");
                    Err(PdfworksError::Auth(INVALID_LOGIN.into()))
                }
                None => {
                    warn!("login rejected: unknown email");
                    Err(PdfworksError::Auth(INVALID_LOGIN.into()))
                }
            }
        })
        .await
    }

    /// Look an account up by email.
    pub async fn find(&self, email: &str) -> Result<Option<UserCredential>> {
        let email = email.trim().to_owned();
        let conn = self.pool.get().await?;
        run_blocking(move || find_by_email(&conn, &email)).await
    }
}

fn require_credentials(email: &str, password: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(PdfworksError::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok(email.to_owned())
}

fn insert_user(conn: &PooledConnection, email: &str, password_hash: &str) -> Result<i64> {
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![email, password_hash, created_at],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            PdfworksError::Conflict("User with this email already exists".into())
        }
        _ => db_err(e),
    })?;
    Ok(conn.last_insert_rowid())
}

fn find_by_email(conn: &PooledConnection, email: &str) -> Result<Option<UserCredential>> {
    conn.query_row(
        "SELECT user_id, email, password_hash, created_at FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok(UserCredential {
                user_id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(db_err)
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| PdfworksError::Internal(format!("credential task failed: {e}")))?
}
