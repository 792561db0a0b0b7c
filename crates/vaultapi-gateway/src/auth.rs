// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication.
//!
//! Every protected request must carry `Authorization: Bearer <apikey>`. The
//! token is compared in constant time. Anything else is rejected before the
//! request reaches admission control or the store.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use vaultapi_core::VaultError;

use crate::error::ApiError;
use crate::gate::AccessGate;

/// Checks bearer tokens against the configured API key.
pub struct Authenticator {
    apikey: SecretString,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("apikey", &"[redacted]")
            .finish()
    }
}

impl Authenticator {
    pub fn new(apikey: SecretString) -> Self {
        Self { apikey }
    }

    /// Accept only a token equal to the API key.
    ///
    /// `None` (no header, or a scheme other than Bearer) is rejected, as is an
    /// empty configured key.
    pub fn authenticate(&self, token: Option<&str>) -> Result<(), VaultError> {
        let Some(token) = token else {
            tracing::debug!("auth failed: missing bearer token");
            return Err(VaultError::Unauthenticated);
        };
        let expected = self.apikey.expose_secret().as_bytes();
        if expected.is_empty() || expected.len() != token.len() {
            tracing::debug!("auth failed: token length mismatch");
            return Err(VaultError::Unauthenticated);
        }
        if bool::from(expected.ct_eq(token.as_bytes())) {
            Ok(())
        } else {
            tracing::debug!("auth failed: invalid token");
            Err(VaultError::Unauthenticated)
        }
    }
}

/// The token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware rejecting requests without the correct bearer token.
pub async fn auth_middleware(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate.authenticate(bearer_token(request.headers()))?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn authenticator() -> Authenticator {
        Authenticator::new(SecretString::from("secret-token".to_string()))
    }

    #[test]
    fn correct_token_is_accepted() {
        assert!(authenticator().authenticate(Some("secret-token")).is_ok());
    }

    #[test]
    fn wrong_or_missing_token_is_rejected() {
        let auth = authenticator();
        for token in [None, Some(""), Some("secret-tokeN"), Some("secret-token-longer")] {
            assert!(
                matches!(auth.authenticate(token), Err(VaultError::Unauthenticated)),
                "{token:?}"
            );
        }
    }

    #[test]
    fn empty_configured_key_rejects_everything() {
        let auth = Authenticator::new(SecretString::from(String::new()));
        assert!(auth.authenticate(Some("")).is_err());
    }

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn debug_redacts_apikey() {
        let debug = format!("{:?}", authenticator());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[redacted]"));
    }
}
