// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics for `vaultapi serve` and `vaultapi check-config`.
//!
//! Figment errors and validation failures become [`ConfigError`]s carrying the
//! dotted key (`transit.key_length`), a vaultapi-specific hint for that key and,
//! when the key came from a TOML file, a labelled span in that file.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score above which a near-miss key is suggested.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Names people reach for that map onto a real key.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("api_key", "apikey"),
    ("token", "apikey"),
    ("bearer", "apikey"),
    ("bucket_width", "bucket_width_secs"),
    ("window_secs", "bucket_width_secs"),
    ("key_size", "key_length"),
    ("key", "static_key"),
    ("database", "database_path"),
    ("db_path", "database_path"),
    ("path", "database_path"),
    ("wal", "wal_mode"),
    ("origins", "allowed_origins"),
    ("cors_origins", "allowed_origins"),
    ("max", "max_requests"),
    ("limit", "max_requests"),
    ("window", "seconds"),
    ("rate_limits", "rate_limit"),
    ("ratelimit", "rate_limit"),
];

/// A configuration problem, rendered through miette at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section accepts.
    #[error("unknown configuration key `{key}` in {}", section_label(section))]
    #[diagnostic(
        code(vaultapi::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted section path, empty at the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a vaultapi setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("`{key}` has the wrong type: found {found}, expected {expected}")]
    #[diagnostic(code(vaultapi::config::invalid_type))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[help]
        hint: Option<String>,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key with no value from any file or env var.
    #[error("missing required key `{key}`")]
    #[diagnostic(code(vaultapi::config::missing_key))]
    MissingKey {
        key: String,
        #[help]
        hint: Option<String>,
    },

    /// A value that parsed but is not usable.
    #[error("invalid `{key}`: {message}")]
    #[diagnostic(code(vaultapi::config::validation))]
    Validation {
        key: String,
        message: String,
        #[help]
        hint: Option<String>,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(vaultapi::config::other))]
    Other(String),
}

impl ConfigError {
    /// Missing `key`, with a hint naming the env var that can supply it.
    pub fn missing(key: impl Into<String>) -> Self {
        let key = key.into();
        let hint = Some(match env_var_for(&key) {
            Some(var) => format!("set `{key}` in vaultapi.toml or export {var}"),
            None => format!("set `{key}` in vaultapi.toml"),
        });
        ConfigError::MissingKey { key, hint }
    }

    /// Unusable value for `key`; the hint comes from [`key_hint`].
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        let key = key.into();
        let hint = key_hint(&key).map(str::to_string);
        ConfigError::Validation {
            key,
            message: message.into(),
            hint,
        }
    }

    /// The dotted key this error is about, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::UnknownKey { key, .. }
            | ConfigError::InvalidType { key, .. }
            | ConfigError::MissingKey { key, .. }
            | ConfigError::Validation { key, .. } => Some(key),
            ConfigError::Other(_) => None,
        }
    }
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Env var overriding `key`, if the key can be set from the environment.
///
/// `auth.apikey` uses the `VAULTAPI_APIKEY` shorthand. `[[rate_limit]]` rules
/// are file-only.
pub fn env_var_for(key: &str) -> Option<String> {
    if key == "auth.apikey" {
        return Some("VAULTAPI_APIKEY".to_string());
    }
    if key.starts_with("rate_limit") || !key.contains('.') {
        return None;
    }
    Some(format!("VAULTAPI_{}", key.replace('.', "_").to_ascii_uppercase()))
}

/// Operator-facing guidance for a dotted key. Indices such as
/// `rate_limit[2].seconds` share the hint of their rule.
pub fn key_hint(key: &str) -> Option<&'static str> {
    if key.starts_with("rate_limit") {
        return Some(
            "each [[rate_limit]] table needs `max_requests` and `seconds`, both at least 1",
        );
    }
    let hint = match key {
        "server.host" => "an IP address or hostname to bind, e.g. `127.0.0.1`",
        "server.port" => "a TCP port between 1 and 65535",
        "server.log_level" => "one of trace, debug, info, warn, error; RUST_LOG overrides it",
        "server.allowed_origins" => {
            "a list of http(s) origins, or [\"*\"] to allow any origin"
        }
        "auth.apikey" => {
            "the bearer token clients send; it also seeds the transit key, so keep it out of files you commit"
        }
        "transit.enabled" | "transit.tolerate_previous_bucket" | "storage.wal_mode" => {
            "`true` or `false`"
        }
        "transit.bucket_width_secs" => {
            "seconds per key-derivation window; clients must use the same width"
        }
        "transit.key_length" => "16 for AES-128, 24 for AES-192 or 32 for AES-256",
        "transit.static_key" => {
            "standard base64 of 16, 24 or 32 random bytes, e.g. `openssl rand -base64 32`"
        }
        "storage.database_path" => "path to the SQLite file; `.db` is appended when missing",
        _ => return None,
    };
    Some(hint)
}

/// Convert a `figment::Error` into one [`ConfigError`] per underlying error.
///
/// `toml_sources` holds `(path, content)` for every file that may have
/// contributed, so unknown or mistyped keys can be pointed at.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate_key(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section.join("."),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => {
                    let mut path = section.clone();
                    path.push(field.to_string());
                    ConfigError::missing(path.join("."))
                }
                Kind::InvalidType(actual, expected) => {
                    let key = section.join(".");
                    let (span, src) = match section.split_last() {
                        Some((field, parents)) => {
                            locate_key(&error, parents, field, toml_sources)
                        }
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        hint: key_hint(&key).map(str::to_string),
                        key,
                        found: actual.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Span of `field` under `section` in the file the error's value came from.
fn locate_key(
    error: &figment::error::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(origin)) =
        error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };

    // figment records the resolved path; callers may have passed a relative one.
    let found = toml_sources
        .iter()
        .find(|(path, _)| origin.as_path() == Path::new(path) || origin.ends_with(path))
        .and_then(|(path, content)| {
            find_key_offset(content, section, field).map(|offset| (path, content, offset))
        });

    match found {
        Some((path, content, offset)) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` in TOML `content`, searching after the header of
/// `path`'s first section (`[transit]` or `[[rate_limit]]`). Top-level keys
/// are searched from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let table = format!("[{section}]");
            let array = format!("[[{section}]]");
            content
                .find(&array)
                .map(|pos| pos + array.len())
                .or_else(|| content.find(&table).map(|pos| pos + table.len()))?
        }
    };

    let mut offset = search_start;
    for line in content[search_start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        let is_key = trimmed
            .strip_prefix(field)
            .is_some_and(|after| after.starts_with([' ', '\t', '=']));
        if is_key {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// Suggest the key the operator probably meant.
///
/// Known aliases (`api_key`, `db_path`, ...) and case-only differences win;
/// otherwise the closest valid key by Jaro-Winkler similarity, if close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let lowered = unknown.to_ascii_lowercase();
    let alias = KEY_ALIASES
        .iter()
        .find(|(from, to)| *from == lowered && valid_keys.contains(to))
        .map(|(_, to)| *to);
    let exact = valid_keys.iter().copied().find(|k| *k == lowered);

    if let Some(key) = alias.or(exact) {
        return Some(key.to_string());
    }

    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(&lowered, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render every error with miette's graphical handler, preceded by a count.
pub fn render_to_string(errors: &[ConfigError]) -> String {
    let handler = GraphicalReportHandler::new();
    let mut out = format!(
        "vaultapi: {} configuration error{}\n",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            out.push_str(&buf);
        } else {
            out.push_str(&format!("Error: {error}\n"));
        }
    }
    out
}

/// Write [`render_to_string`] to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_to_string(errors));
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSIT_KEYS: &[&str] = &[
        "enabled",
        "bucket_width_secs",
        "key_length",
        "tolerate_previous_bucket",
        "static_key",
    ];

    #[test]
    fn aliases_win_over_similarity() {
        assert_eq!(suggest_key("api_key", &["apikey"]), Some("apikey".into()));
        assert_eq!(
            suggest_key("db_path", &["database_path", "wal_mode"]),
            Some("database_path".into())
        );
        // An alias only applies when its target is valid in this section.
        assert_eq!(suggest_key("token", &["host", "port"]), None);
    }

    #[test]
    fn suggestion_ignores_case() {
        assert_eq!(suggest_key("KEY_LENGTH", TRANSIT_KEYS), Some("key_length".into()));
    }

    #[test]
    fn suggests_closest_key_for_typo() {
        assert_eq!(suggest_key("key_lenght", TRANSIT_KEYS), Some("key_length".into()));
        assert_eq!(suggest_key("zzzzzz", TRANSIT_KEYS), None);
    }

    #[test]
    fn env_var_names_follow_loader_mapping() {
        assert_eq!(env_var_for("auth.apikey").as_deref(), Some("VAULTAPI_APIKEY"));
        assert_eq!(
            env_var_for("transit.key_length").as_deref(),
            Some("VAULTAPI_TRANSIT_KEY_LENGTH")
        );
        assert_eq!(env_var_for("rate_limit.0.seconds"), None);
    }

    #[test]
    fn missing_apikey_points_at_env_var() {
        let err = ConfigError::missing("auth.apikey");
        let help = err.help().map(|h| h.to_string()).unwrap();
        assert!(help.contains("VAULTAPI_APIKEY"), "got: {help}");
    }

    #[test]
    fn validation_errors_carry_key_hints() {
        let err = ConfigError::invalid("rate_limit[3].seconds", "must be at least 1");
        assert_eq!(err.key(), Some("rate_limit[3].seconds"));
        assert!(err.help().unwrap().to_string().contains("[[rate_limit]]"));
        assert_eq!(err.to_string(), "invalid `rate_limit[3].seconds`: must be at least 1");

        assert!(ConfigError::invalid("server.unknown", "x").help().is_none());
    }

    #[test]
    fn unknown_key_names_its_section() {
        let err = ConfigError::UnknownKey {
            key: "burst".into(),
            section: "rate_limit".into(),
            suggestion: None,
            valid_keys: "max_requests, seconds".into(),
            span: None,
            src: None,
        };
        assert_eq!(err.to_string(), "unknown configuration key `burst` in [rate_limit]");
    }

    #[test]
    fn rendered_report_counts_errors() {
        let out = render_to_string(&[
            ConfigError::missing("auth.apikey"),
            ConfigError::invalid("transit.key_length", "must be 16, 24 or 32, got 20"),
        ]);
        assert!(out.starts_with("vaultapi: 2 configuration errors"));
        assert!(out.contains("VAULTAPI_APIKEY"));
        assert!(out.contains("AES-192"));
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[server]\nport = 1\n\n[transit]\nkey_lenght = 16\n";
        let o = find_key_offset(content, &["transit".to_string()], "key_lenght").unwrap();
        assert_eq!(&content[o..o + 10], "key_lenght");
    }

    #[test]
    fn find_key_offset_in_array_of_tables() {
        let content = "[[rate_limit]]\nmax_requests = 5\nburst = 2\n";
        let o = find_key_offset(content, &["rate_limit".to_string()], "burst").unwrap();
        assert_eq!(&content[o..o + 5], "burst");
    }

    #[test]
    fn find_key_offset_handles_crlf_and_prefix_keys() {
        let content = "[auth]\r\napikeys = 1\r\napikey = \"x\"\r\n";
        let o = find_key_offset(content, &["auth".to_string()], "apikey").unwrap();
        assert_eq!(&content[o..o + 8], "apikey =");
    }
}
