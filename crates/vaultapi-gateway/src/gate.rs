// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The access gate: authentication first, then admission control.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vaultapi_core::VaultError;

use crate::admission::RateLimiter;
use crate::auth::Authenticator;

/// Every protected operation passes through here.
#[derive(Debug)]
pub struct AccessGate {
    authenticator: Authenticator,
    limiter: RateLimiter,
}

impl AccessGate {
    pub fn new(authenticator: Authenticator, limiter: RateLimiter) -> Self {
        Self {
            authenticator,
            limiter,
        }
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<(), VaultError> {
        self.authenticator.authenticate(token)
    }

    pub fn admit(&self, client_id: &str) -> Result<(), VaultError> {
        self.limiter.admit(client_id)
    }

    /// Authenticate, then admit. A request that fails authentication is never
    /// counted against the client's rate limits.
    pub fn check(&self, token: Option<&str>, client_id: &str) -> Result<(), VaultError> {
        self.authenticate(token)?;
        self.admit(client_id)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// Periodically prune expired rate-limit windows until `shutdown` fires.
pub async fn run_pruner(
    gate: std::sync::Arc<AccessGate>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let removed = gate.limiter().prune(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "pruned rate-limit windows");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::admission::RateLimitRule;
    use secrecy::SecretString;

    fn gate(max: u32) -> AccessGate {
        AccessGate::new(
            Authenticator::new(SecretString::from("k".to_string())),
            RateLimiter::new(vec![RateLimitRule::new(max, 60)]),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_requests_are_not_counted() {
        let gate = gate(1);
        for _ in 0..5 {
            assert!(matches!(
                gate.check(Some("wrong"), "c"),
                Err(VaultError::Unauthenticated)
            ));
        }
        assert_eq!(gate.limiter().tracked_windows(), 0);
        gate.check(Some("k"), "c").unwrap();
        assert!(matches!(
            gate.check(Some("k"), "c"),
            Err(VaultError::RateLimited { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_credentials_win_over_rate_limit() {
        let gate = gate(1);
        gate.check(Some("k"), "c").unwrap();
        assert!(matches!(
            gate.check(None, "c"),
            Err(VaultError::Unauthenticated)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pruner_stops_on_shutdown_and_prunes() {
        let gate = Arc::new(gate(10));
        gate.check(Some("k"), "c").unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_pruner(
            gate.clone(),
            Duration::from_secs(30),
            token.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(gate.limiter().tracked_windows(), 0);

        token.cancel();
        handle.await.unwrap();
    }
}
