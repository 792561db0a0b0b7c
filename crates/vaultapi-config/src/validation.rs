// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! a present API key, supported AES key lengths, positive window sizes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::diagnostic::ConfigError;
use crate::model::VaultApiConfig;

/// AES key lengths the transit cipher supports, in bytes.
pub const SUPPORTED_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &VaultApiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    if config.auth.apikey.is_empty() {
        errors.push(ConfigError::missing("auth.apikey"));
    }

    let mut fail = |key: &str, message: String| errors.push(ConfigError::invalid(key, message));

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host", "must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(
                "server.host",
                format!("`{host}` is not a valid IP address or hostname"),
            );
        }
    }

    if config.server.port == 0 {
        fail("server.port", "must be between 1 and 65535".to_string());
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(
            "server.log_level",
            format!(
                "`{}` must be one of: {}",
                config.server.log_level,
                LOG_LEVELS.join(", ")
            ),
        );
    }

    for origin in &config.server.allowed_origins {
        let ok = origin == "*" || origin.starts_with("http://") || origin.starts_with("https://");
        if !ok {
            fail(
                "server.allowed_origins",
                format!("entry `{origin}` must be `*` or an http(s) origin"),
            );
        }
    }

    if config.transit.bucket_width_secs == 0 {
        fail("transit.bucket_width_secs", "must be at least 1".to_string());
    }

    if !SUPPORTED_KEY_LENGTHS.contains(&config.transit.key_length) {
        fail(
            "transit.key_length",
            format!("must be 16, 24 or 32, got {}", config.transit.key_length),
        );
    }

    if let Some(static_key) = &config.transit.static_key {
        match STANDARD.decode(static_key.trim()) {
            Ok(bytes) if SUPPORTED_KEY_LENGTHS.contains(&bytes.len()) => {}
            Ok(bytes) => fail(
                "transit.static_key",
                format!("must decode to 16, 24 or 32 bytes, got {}", bytes.len()),
            ),
            Err(_) => fail("transit.static_key", "is not valid base64".to_string()),
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path", "must not be empty".to_string());
    }

    for (i, rule) in config.rate_limit.iter().enumerate() {
        if rule.max_requests == 0 {
            fail(&format!("rate_limit[{i}].max_requests"), "must be at least 1".to_string());
        }
        if rule.seconds == 0 {
            fail(&format!("rate_limit[{i}].seconds"), "must be at least 1".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RateLimitConfig;

    fn valid_config() -> VaultApiConfig {
        let mut config = VaultApiConfig::default();
        config.auth.apikey = "test-apikey".to_string();
        config
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors.iter().any(|e| e.to_string().contains(needle))
    }

    #[test]
    fn defaults_with_apikey_validate() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn missing_apikey_fails_validation() {
        let errors = validate_config(&VaultApiConfig::default()).unwrap_err();
        assert!(matches!(
            &errors[..],
            [ConfigError::MissingKey { key, hint: Some(hint) }]
                if key == "auth.apikey" && hint.contains("VAULTAPI_APIKEY")
        ));
    }

    #[test]
    fn unsupported_key_length_fails_validation() {
        let mut config = valid_config();
        config.transit.key_length = 20;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "transit.key_length"));
    }

    #[test]
    fn zero_bucket_width_fails_validation() {
        let mut config = valid_config();
        config.transit.bucket_width_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bucket_width_secs"));
    }

    #[test]
    fn static_key_must_be_aes_sized() {
        let mut config = valid_config();
        // 10 bytes
        config.transit.static_key = Some(STANDARD.encode([7u8; 10]));
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "got 10"));

        config.transit.static_key = Some(STANDARD.encode([7u8; 24]));
        assert!(validate_config(&config).is_ok());

        config.transit.static_key = Some("!!not base64!!".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "not valid base64"));
    }

    #[test]
    fn zero_rate_limit_fields_fail_validation() {
        let mut config = valid_config();
        config.rate_limit = vec![
            RateLimitConfig {
                max_requests: 5,
                seconds: 2,
            },
            RateLimitConfig {
                max_requests: 0,
                seconds: 0,
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "rate_limit[1].max_requests"));
        assert!(has_message(&errors, "rate_limit[1].seconds"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = VaultApiConfig::default();
        config.storage.database_path = "  ".to_string();
        config.server.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
        assert!(has_message(&errors, "server.port"));
        assert!(has_message(&errors, "auth.apikey"));
    }

    #[test]
    fn bad_origin_and_log_level_fail_validation() {
        let mut config = valid_config();
        config.server.allowed_origins = vec!["https://ok.example".into(), "ftp://nope".into()];
        config.server.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "ftp://nope"));
        assert!(has_message(&errors, "log_level"));
        assert_eq!(errors.len(), 2);
    }
}
