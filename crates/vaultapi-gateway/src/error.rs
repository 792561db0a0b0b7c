// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of [`VaultError`] as HTTP responses.
//!
//! Every response body has the shape `{"detail": ...}`, including axum
//! extractor rejections.

use std::time::Duration;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use vaultapi_core::{StatusClass, VaultError};

/// Response body for every route.
#[derive(Debug, Serialize)]
pub struct Detail<T> {
    pub detail: T,
}

/// `(status, {"detail": value})` as a response.
pub fn detail<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(Detail { detail: value })).into_response()
}

/// HTTP status for an outcome class.
pub fn status_code(class: StatusClass) -> StatusCode {
    match class {
        StatusClass::Ok => StatusCode::OK,
        StatusClass::NotFound => StatusCode::NOT_FOUND,
        StatusClass::Unauthorized => StatusCode::UNAUTHORIZED,
        StatusClass::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        StatusClass::BadRequest => StatusCode::BAD_REQUEST,
        StatusClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Whole seconds for a `Retry-After` header, rounded up and never zero.
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// A failure on its way out of a handler or middleware.
#[derive(Debug)]
pub enum ApiError {
    Vault(VaultError),
    /// The request could not be extracted (bad JSON body, missing query
    /// parameter). Keeps axum's status and reason text.
    Rejected { status: StatusCode, message: String },
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        ApiError::Vault(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Vault(err) => err,
            ApiError::Rejected { status, message } => {
                tracing::debug!(status = status.as_u16(), %message, "request not extracted");
                return detail(status, message);
            }
        };

        let status = status_code(err.status_class());
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
        }

        let message = match &err {
            VaultError::Unauthenticated => "Not authenticated".to_string(),
            other => other.to_string(),
        };
        let mut response = detail(status, message);

        if let Some(wait) = err.retry_after() {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs(wait).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_map_to_expected_statuses() {
        assert_eq!(status_code(StatusClass::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_code(StatusClass::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_code(StatusClass::BadRequest), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_code(StatusClass::ServerError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = ApiError::Vault(VaultError::RateLimited {
            retry_after: Duration::from_secs(7),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[test]
    fn unauthenticated_response_asks_for_bearer() {
        let response = ApiError::Vault(VaultError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn store_error_is_server_error() {
        let response = ApiError::Vault(VaultError::Store("no such table: x".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rejection_keeps_status_and_uses_detail_body() {
        let response = ApiError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `key`".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "missing field `key`");
    }
}
