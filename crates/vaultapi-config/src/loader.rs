// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vaultapi.toml` > `~/.config/vaultapi/vaultapi.toml` >
//! `/etc/vaultapi/vaultapi.toml` with environment variable overrides via the
//! `VAULTAPI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VaultApiConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/vaultapi/vaultapi.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "vaultapi.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vaultapi/vaultapi.toml` (system-wide)
/// 3. `~/.config/vaultapi/vaultapi.toml` (user XDG config)
/// 4. `./vaultapi.toml` (local directory)
/// 5. `VAULTAPI_*` environment variables
pub fn load_config() -> Result<VaultApiConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VaultApiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultApiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VaultApiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VaultApiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(VaultApiConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/vaultapi/vaultapi.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("vaultapi").join(LOCAL_CONFIG_FILE))
}

/// Env var read by the CLI for `--config`; not a config key.
const CONFIG_PATH_VAR: &str = "config";

/// Create the environment variable provider using explicit section-to-dot mapping.
///
/// Uses an explicit mapping rather than `Env::split("_")` because field names
/// contain underscores: `VAULTAPI_TRANSIT_KEY_LENGTH` must map to
/// `transit.key_length`, not `transit.key.length`. A bare `VAULTAPI_APIKEY` is
/// accepted as a shorthand for `auth.apikey`, and `VAULTAPI_CONFIG` is skipped.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("VAULTAPI_").filter_map(|key| {
        // figment keeps the env var's original case after stripping the prefix.
        let key = key.as_str().to_ascii_lowercase();
        match key.as_str() {
            CONFIG_PATH_VAR => None,
            "apikey" => Some("auth.apikey".into()),
            _ => Some(map_section(&key).into()),
        }
    })
}

/// `transit_key_length` -> `transit.key_length`; other keys pass through.
fn map_section(key: &str) -> String {
    ["server", "auth", "transit", "storage"]
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or_else(|| key.to_string())
}
