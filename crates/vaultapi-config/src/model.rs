// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the vaultapi server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level vaultapi configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. Every section except `auth.apikey` has a usable default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultApiConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Bearer credential settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Transit encryption settings.
    #[serde(default)]
    pub transit: TransitConfig,

    /// SQLite backing store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admission-control rules. Every rule is enforced on every protected route.
    #[serde(default)]
    pub rate_limit: Vec<RateLimitConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer. Empty means same-origin only.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bearer credential configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// API key every request must present as `Authorization: Bearer <apikey>`.
    /// Also the credential the transit key is derived from.
    #[serde(default)]
    pub apikey: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("apikey", &"[redacted]")
            .finish()
    }
}

/// Transit encryption configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransitConfig {
    /// Encrypt secret values in responses.
    #[serde(default = "default_transit_enabled")]
    pub enabled: bool,

    /// Width of a key-derivation time bucket in seconds.
    #[serde(default = "default_bucket_width_secs")]
    pub bucket_width_secs: u64,

    /// AES key length in bytes: 16, 24 or 32.
    #[serde(default = "default_key_length")]
    pub key_length: usize,

    /// Also accept envelopes sealed under the previous bucket's key.
    #[serde(default)]
    pub tolerate_previous_bucket: bool,

    /// Standard base64 of a 16, 24 or 32 byte key. When set it is used as-is
    /// and no per-bucket key is derived.
    #[serde(default)]
    pub static_key: Option<String>,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            enabled: default_transit_enabled(),
            bucket_width_secs: default_bucket_width_secs(),
            key_length: default_key_length(),
            tolerate_previous_bucket: false,
            static_key: None,
        }
    }
}

impl std::fmt::Debug for TransitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitConfig")
            .field("enabled", &self.enabled)
            .field("bucket_width_secs", &self.bucket_width_secs)
            .field("key_length", &self.key_length)
            .field("tolerate_previous_bucket", &self.tolerate_previous_bucket)
            .field("static_key", &self.static_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn default_transit_enabled() -> bool {
    true
}

fn default_bucket_width_secs() -> u64 {
    60
}

fn default_key_length() -> usize {
    32
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. `.db` is appended when missing.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "secrets.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// A single admission-control rule: at most `max_requests` per `seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub seconds: u64,
}
