// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vaultapi serve` command implementation.
//!
//! Opens the SQLite store, builds the transit cipher and access gate from
//! configuration, and serves the HTTP API until SIGTERM or Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, warn};
use vaultapi_config::model::{AuthConfig, RateLimitConfig, TransitConfig, VaultApiConfig};
use vaultapi_core::{VaultError, DEFAULT_TABLE};
use vaultapi_gateway::{
    run_pruner, start_server, AccessGate, Authenticator, RateLimitRule, RateLimiter,
    ServerConfig, VaultService,
};
use vaultapi_storage::{Database, SecretStore};
use vaultapi_transit::{KeyLength, TransitCipher};

use crate::shutdown;

/// How often expired rate-limit windows are dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the `vaultapi serve` command.
pub async fn run_serve(config: VaultApiConfig) -> Result<(), VaultError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting vaultapi serve");

    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
    let store = SecretStore::new(db.clone());
    store.create_table(DEFAULT_TABLE).await?;
    let tables = store.list_tables().await?;
    info!(
        path = %db.path().display(),
        tables = tables.len(),
        "secret store ready"
    );

    let cipher = build_cipher(&config.auth, &config.transit)?;
    let gate = Arc::new(build_gate(&config.auth, &config.rate_limit));
    let service = Arc::new(VaultService::new(
        store,
        cipher,
        config.transit.enabled,
        gate.clone(),
    ));

    let shutdown = shutdown::install_signal_handler();
    let pruner = tokio::spawn(run_pruner(gate, PRUNE_INTERVAL, shutdown.clone()));

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        allowed_origins: config.server.allowed_origins.clone(),
    };
    let result = start_server(&server_config, service, shutdown.clone()).await;

    // Stop the pruner too when the server exits on its own.
    shutdown.cancel();
    if let Err(e) = pruner.await {
        warn!(error = %e, "rate-limit pruner task failed");
    }
    if let Err(e) = db.close().await {
        warn!(error = %e, "failed to checkpoint database on shutdown");
    }

    info!("vaultapi stopped");
    result
}

/// Transit cipher from configuration: the static key when one is set,
/// otherwise per-bucket keys derived from the API key.
fn build_cipher(auth: &AuthConfig, transit: &TransitConfig) -> Result<TransitCipher, VaultError> {
    match &transit.static_key {
        Some(encoded) => {
            info!("transit cipher using static key");
            TransitCipher::from_static_base64(encoded)
        }
        None => {
            info!(
                bucket_width_secs = transit.bucket_width_secs,
                key_length = transit.key_length,
                tolerate_previous_bucket = transit.tolerate_previous_bucket,
                "transit cipher deriving time-bucketed keys"
            );
            TransitCipher::derived(
                SecretString::from(auth.apikey.clone()),
                transit.bucket_width_secs,
                KeyLength::new(transit.key_length)?,
                transit.tolerate_previous_bucket,
            )
        }
    }
}

fn build_gate(auth: &AuthConfig, rules: &[RateLimitConfig]) -> AccessGate {
    let rules: Vec<RateLimitRule> = rules
        .iter()
        .map(|r| RateLimitRule::new(r.max_requests, r.seconds))
        .collect();
    info!(rules = rules.len(), "access gate configured");
    AccessGate::new(
        Authenticator::new(SecretString::from(auth.apikey.clone())),
        RateLimiter::new(rules),
    )
}

/// Initialize the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vaultapi={log_level},warn")));

    // A second init (e.g. in tests) is not an error worth failing on.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
