// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bearer-token gate. `authenticate` is a pure check over the request
// headers; `AuthenticatedUser` wraps it as an extractor so protected
// handlers name the caller in their signature.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use pdfworks_core::{PdfworksError, Result, TokenError};
use pdfworks_security::TokenSigner;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller of a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Validate the `Authorization: Bearer <token>` header.
pub fn authenticate(headers: &HeaderMap, signer: &TokenSigner) -> Result<AuthenticatedUser> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(PdfworksError::Token(TokenError::Missing))?;

    let claims = signer.verify(token)?;
    debug!(user_id = %claims.user_id, "request authenticated");
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.signer).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::with_ttl_hours(b"gate-secret", 1)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_a_valid_bearer_token() {
        let signer = signer();
        let token = signer.issue("9").unwrap();
        let user = authenticate(&headers(&format!("Bearer {token}")), &signer).unwrap();
        assert_eq!(user.user_id, "9");
    }

    #[test]
    fn missing_or_non_bearer_header_is_missing() {
        let signer = signer();
        for map in [HeaderMap::new(), headers("Basic abc"), headers("Bearer   ")] {
            assert!(matches!(
                authenticate(&map, &signer),
                Err(PdfworksError::Token(TokenError::Missing))
            ));
        }
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert!(matches!(
            authenticate(&headers("Bearer not.a.token"), &signer()),
            Err(PdfworksError::Token(TokenError::Invalid))
        ));
    }
}
