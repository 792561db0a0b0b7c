// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, the access-gate middleware, CORS and request tracing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use vaultapi_core::VaultError;

use crate::admission::admission_middleware;
use crate::auth::auth_middleware;
use crate::handlers;
use crate::service::VaultService;

/// Listener configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins the CORS layer allows. `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

/// Build the application router.
///
/// `/health` is public. Every other route runs authentication, then
/// admission control, then the handler.
pub fn router(service: Arc<VaultService>, allowed_origins: &[String]) -> Router {
    let gate = service.gate().clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(service.clone());

    // route_layer: the last layer added runs first.
    let api_routes = Router::new()
        .route("/get-secret", get(handlers::get_secret))
        .route("/put-secret", post(handlers::put_secret))
        .route("/delete-secret", delete(handlers::delete_secret))
        .route("/create-table", post(handlers::create_table))
        .route("/get-table", get(handlers::get_table))
        .route("/decrypt", post(handlers::decrypt))
        .route_layer(axum_middleware::from_fn_with_state(
            gate.clone(),
            admission_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(gate, auth_middleware))
        .with_state(service);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
}

/// CORS policy for the configured origins.
///
/// No origins means no cross-origin access. Entries that are not valid header
/// values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Bind the configured address and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    service: Arc<VaultService>,
    shutdown: CancellationToken,
) -> Result<(), VaultError> {
    let app = router(service, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VaultError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "vaultapi listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| VaultError::Internal(format!("server error: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}
