// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window admission control.
//!
//! Each rule allows `max_requests` per `window` for each client. Counters live
//! in a [`DashMap`] keyed by `(client, rule)`; an update holds that entry's
//! shard lock for the whole read-modify-write, so concurrent requests from the
//! same client cannot lose increments.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::time::Instant;
use vaultapi_core::VaultError;

use crate::error::ApiError;
use crate::gate::AccessGate;

/// Client id used when the peer address is unavailable.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// At most `max_requests` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitRule {
    pub fn new(max_requests: u32, seconds: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(seconds),
        }
    }
}

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
}

/// Per-client counters for a fixed set of rules.
#[derive(Debug, Default)]
pub struct RateLimiter {
    rules: Vec<RateLimitRule>,
    windows: DashMap<(String, usize), Window>,
}

impl RateLimiter {
    pub fn new(rules: Vec<RateLimitRule>) -> Self {
        Self {
            rules,
            windows: DashMap::new(),
        }
    }

    /// Count a request from `client_id` against every rule.
    pub fn admit(&self, client_id: &str) -> Result<(), VaultError> {
        self.admit_at(client_id, Instant::now())
    }

    /// Count a request from `client_id` arriving at `now`.
    ///
    /// Every rule is charged even when an earlier one already rejects, and the
    /// longest wait among the violated rules is reported.
    pub fn admit_at(&self, client_id: &str, now: Instant) -> Result<(), VaultError> {
        let mut retry_after: Option<Duration> = None;

        for (idx, rule) in self.rules.iter().enumerate() {
            let mut window = self
                .windows
                .entry((client_id.to_string(), idx))
                .or_insert(Window {
                    start: now,
                    count: 0,
                });

            if now.saturating_duration_since(window.start) >= rule.window {
                window.start = now;
                window.count = 0;
            }
            window.count = window.count.saturating_add(1);

            if window.count > rule.max_requests {
                let wait = rule
                    .window
                    .saturating_sub(now.saturating_duration_since(window.start));
                retry_after = Some(retry_after.map_or(wait, |w| w.max(wait)));
            }
        }

        match retry_after {
            Some(retry_after) => {
                tracing::info!(
                    client = %client_id,
                    retry_after_secs = retry_after.as_secs(),
                    "rate limit exceeded"
                );
                Err(VaultError::RateLimited { retry_after })
            }
            None => Ok(()),
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|(_, idx), window| {
            self.rules
                .get(*idx)
                .is_some_and(|rule| now.saturating_duration_since(window.start) < rule.window)
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of live `(client, rule)` windows.
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }
}

/// Client identity for admission: the peer IP when the server recorded it.
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware charging each request against the rate-limit rules.
///
/// Runs inside [`crate::auth::auth_middleware`], so only authenticated
/// requests are counted.
pub async fn admission_middleware(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate.admit(&client_id(&request))?;
    Ok(next.run(request).await)
}
