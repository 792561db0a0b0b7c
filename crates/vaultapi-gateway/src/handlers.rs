// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the secret API.
//!
//! Every response body is `{"detail": ...}`. Errors, extractor rejections
//! included, are rendered by [`ApiError`].

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use vaultapi_core::DEFAULT_TABLE;

use crate::error::{detail, ApiError};
use crate::service::VaultService;

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Query for GET /get-secret.
#[derive(Debug, Deserialize)]
pub struct GetSecretQuery {
    pub key: String,
    #[serde(default = "default_table")]
    pub table_name: String,
}

/// Body for POST /put-secret.
#[derive(Debug, Deserialize)]
pub struct PutSecretRequest {
    pub key: String,
    pub value: String,
    #[serde(default = "default_table")]
    pub table_name: String,
}

/// Body for DELETE /delete-secret.
#[derive(Debug, Deserialize)]
pub struct DeleteSecretRequest {
    pub key: String,
    #[serde(default = "default_table")]
    pub table_name: String,
}

/// Query for POST /create-table.
#[derive(Debug, Deserialize)]
pub struct CreateTableQuery {
    pub table_name: String,
}

/// Query for GET /get-table.
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    #[serde(default = "default_table")]
    pub table_name: String,
}

/// Body for POST /decrypt.
#[derive(Debug, Deserialize)]
pub struct DecryptRequest {
    pub ciphertext: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Not Found")
}

fn ok() -> Response {
    detail(StatusCode::OK, "OK")
}

/// GET /health
///
/// Unauthenticated. Reports 503 when the database does not answer.
pub async fn get_health(State(service): State<Arc<VaultService>>) -> Response {
    let status = match service.store().database().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status.0,
        Json(HealthResponse {
            status: status.1.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
        .into_response()
}

/// GET /get-secret
pub async fn get_secret(
    State(service): State<Arc<VaultService>>,
    query: Result<Query<GetSecretQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    match service.get_secret(&query.table_name, &query.key).await? {
        Some(value) => Ok(detail(StatusCode::OK, value)),
        None => Ok(not_found()),
    }
}

/// POST /put-secret
pub async fn put_secret(
    State(service): State<Arc<VaultService>>,
    body: Result<Json<PutSecretRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    service
        .put_secret(&body.table_name, &body.key, &body.value)
        .await?;
    Ok(ok())
}

/// DELETE /delete-secret
pub async fn delete_secret(
    State(service): State<Arc<VaultService>>,
    body: Result<Json<DeleteSecretRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    if service.delete_secret(&body.table_name, &body.key).await? {
        Ok(ok())
    } else {
        Ok(not_found())
    }
}

/// POST /create-table
pub async fn create_table(
    State(service): State<Arc<VaultService>>,
    query: Result<Query<CreateTableQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    service.create_table(&query.table_name).await?;
    Ok(ok())
}

/// GET /get-table
pub async fn get_table(
    State(service): State<Arc<VaultService>>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let table = service.get_table(&query.table_name).await?;
    Ok(detail(StatusCode::OK, table))
}

/// POST /decrypt
///
/// Decrypts a transit envelope with the server's current key, so clients can
/// verify they derive the same key.
pub async fn decrypt(
    State(service): State<Arc<VaultService>>,
    body: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let value = service.decrypt_transit(&body.ciphertext)?;
    Ok(detail(StatusCode::OK, value))
}
