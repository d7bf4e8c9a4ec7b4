// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password hashing — PBKDF2-HMAC-SHA256 via `ring`.
//
// Encoded form (one TEXT column):
//   pbkdf2-sha256$<iterations>$<salt, base64>$<derived key, base64>

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use pdfworks_core::error::{PdfworksError, Result};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, instrument};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Iteration count for newly created hashes.
pub const DEFAULT_ITERATIONS: u32 = 210_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hashes and verifies user passwords.
///
/// Verification reads the iteration count from the stored hash, so raising
/// the cost only affects hashes created afterwards.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
}

impl PasswordHasher {
    /// Hasher with a custom cost. Zero is bumped to one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Derive a salted hash of `password` in the encoded form above.
    #[instrument(skip_all, fields(iterations = self.iterations.get()))]
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| PdfworksError::Internal("system random source unavailable".into()))?;

        let mut derived = [0u8; KEY_LEN];
        pbkdf2::derive(ALGORITHM, self.iterations, &salt, password.as_bytes(), &mut derived);

        debug!("password hashed");
        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(derived)
        ))
    }

    /// Check `password` against an encoded hash in constant time.
    ///
    /// A malformed stored hash never verifies.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((iterations, salt, expected)) = decode(encoded) else {
            return false;
        };
        pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &expected).is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }
}

fn decode(encoded: &str) -> Option<(NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().and_then(NonZeroU32::new)?;
    let salt = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    let key = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    if parts.next().is_some() || key.len() != KEY_LEN {
        return None;
    }
    Some((iterations, salt, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::with_iterations(1_000)
    }

    #[test]
    fn verifies_only_the_original_password() {
        let hasher = fast();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("correct horse ", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = fast();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn encoded_form_records_cost() {
        let hash = fast().hash("pw").unwrap();
        assert!(hash.starts_with("pbkdf2-sha256$1000$"), "{hash}");
        // A hasher with a different default cost still verifies it.
        assert!(PasswordHasher::with_iterations(5).verify("pw", &hash));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let hasher = fast();
        for bad in ["", "plain", "bcrypt$1000$a$b", "pbkdf2-sha256$0$AA$AA", "pbkdf2-sha256$10$!!$AA"] {
            assert!(!hasher.verify("pw", bad), "{bad}");
        }
    }
}
