// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the vaultapi secret store.

use std::time::Duration;

use thiserror::Error;

use crate::types::StatusClass;

/// The primary error type shared by the store, the transit cipher and the gate.
///
/// Display output never contains key material or secret values. Store errors
/// carry the backing-store message verbatim, which may mention table names.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or wrong bearer credential.
    #[error("not authenticated")]
    Unauthenticated,

    /// A rate-limit rule rejected the request.
    #[error("rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// A table name failed the identifier allow-list.
    #[error("invalid identifier `{0}`: only ASCII letters, digits and underscores are allowed")]
    InvalidIdentifier(String),

    /// Backing-store failure (missing table, I/O, constraint violation).
    #[error("store error: {0}")]
    Store(String),

    /// AEAD tag verification failed: wrong key, wrong time bucket, or tampering.
    #[error("authentication failed: envelope could not be verified")]
    Authentication,

    /// Decrypted plaintext (or the transport encoding) could not be decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid startup parameters, such as an unsupported key length.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// The stable classification the service boundary renders for this error.
    pub fn status_class(&self) -> StatusClass {
        match self {
            VaultError::Unauthenticated => StatusClass::Unauthorized,
            VaultError::RateLimited { .. } => StatusClass::RateLimited,
            VaultError::InvalidIdentifier(_)
            | VaultError::MalformedPayload(_)
            | VaultError::Authentication => StatusClass::BadRequest,
            VaultError::Store(_) | VaultError::Config(_) | VaultError::Internal(_) => {
                StatusClass::ServerError
            }
        }
    }

    /// Retry hint for rate-limited requests.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            VaultError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_status_class() {
        let cases = [
            (VaultError::Unauthenticated, StatusClass::Unauthorized),
            (
                VaultError::RateLimited {
                    retry_after: Duration::from_secs(3),
                },
                StatusClass::RateLimited,
            ),
            (
                VaultError::InvalidIdentifier("a b".into()),
                StatusClass::BadRequest,
            ),
            (VaultError::Store("no such table: t".into()), StatusClass::ServerError),
            (VaultError::Authentication, StatusClass::BadRequest),
            (
                VaultError::MalformedPayload("eof".into()),
                StatusClass::BadRequest,
            ),
            (VaultError::Config("bad".into()), StatusClass::ServerError),
            (VaultError::Internal("oops".into()), StatusClass::ServerError),
        ];
        for (err, class) in cases {
            assert_eq!(err.status_class(), class, "{err}");
        }
    }

    #[test]
    fn retry_after_only_on_rate_limited() {
        let limited = VaultError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(limited.to_string(), "rate limited, retry after 42s");
        assert!(VaultError::Unauthenticated.retry_after().is_none());
    }

    #[test]
    fn store_error_keeps_backing_message() {
        let err = VaultError::Store("no such table: missing".into());
        assert!(err.to_string().contains("no such table: missing"));
    }
}
