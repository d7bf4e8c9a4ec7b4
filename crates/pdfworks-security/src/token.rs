// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bearer tokens — compact HS256 JSON Web Tokens signed with `ring::hmac`.
//
//   base64url(header) . base64url(claims) . base64url(HMAC-SHA256)
//
// The signature is checked before the claims are trusted, so an expired
// token is only reported as expired when it is otherwise genuine.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use pdfworks_core::error::{Result, TokenError};
use ring::hmac;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            ttl,
        }
    }

    /// Signer with a lifetime in whole hours (at least one).
    pub fn with_ttl_hours(secret: &[u8], hours: i64) -> Self {
        Self::new(secret, Duration::hours(hours.max(1)))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`, valid from now for the configured TTL.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String> {
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let claims = Claims {
            user_id: user_id.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let tag = hmac::sign(&self.key, signing_input.as_bytes());

        debug!(user_id, exp = claims.exp, "token issued");
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref())))
    }

    /// Verify `token` and return its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Invalid)?;
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        hmac::verify(&self.key, token[..signing_input_len].as_bytes(), &signature)
            .map_err(|_| TokenError::Invalid)?;

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::Invalid);
        }
        let claims: Claims = decode_json(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> std::result::Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::with_ttl_hours(b"test-secret", 24)
    }

    #[test]
    fn issued_token_verifies() {
        let signer = signer();
        let token = signer.issue("42").unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, "42");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let signer = signer();
        let issued = Utc::now() - Duration::hours(25);
        let token = signer.issue_at("7", issued).unwrap();
        assert_eq!(signer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_claims_are_invalid() {
        let signer = signer();
        let token = signer.issue("1").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"user_id":"2","iat":0,"exp":9999999999}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(signer.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let token = TokenSigner::with_ttl_hours(b"other", 24).issue("1").unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_with_bad_signature_is_invalid() {
        let old = Utc::now() - Duration::hours(48);
        let token = TokenSigner::with_ttl_hours(b"other", 24).issue_at("1", old).unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn malformed_tokens_are_invalid() {
        let signer = signer();
        for bad in ["", "abc", "a.b", "a.b.c", "a.b.c.d", "...."] {
            assert_eq!(signer.verify(bad), Err(TokenError::Invalid), "{bad:?}");
        }
    }
}
