// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfworks-security — Identity primitives for the pdfworks API.
//
// Password hashing (PBKDF2), signed bearer tokens (HS256), and the pooled
// SQLite credential store that backs register/login.

pub mod credentials;
pub mod password;
pub mod pool;
pub mod token;

// Re-export the primary types so callers can use `pdfworks_security::TokenSigner` etc.
pub use credentials::{CredentialStore, UserCredential};
pub use password::PasswordHasher;
pub use pool::{ConnectionPool, PooledConnection};
pub use token::{Claims, TokenSigner};
