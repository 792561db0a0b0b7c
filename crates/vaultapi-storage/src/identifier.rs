// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Allow-list validation for table names.
//!
//! Table names are spliced into SQL text (SQLite cannot bind identifiers), so
//! every name is checked here before any statement is formatted.

use vaultapi_core::VaultError;

/// Longest accepted table name.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Accept `^[A-Za-z0-9_]{1,64}$`, reject everything else.
pub fn validate_identifier(name: &str) -> Result<(), VaultError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(VaultError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["default", "prod_db", "T1", "_", "a".repeat(64).as_str()] {
            assert!(validate_identifier(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_injection_and_punctuation() {
        for name in [
            "",
            "x\"; DROP TABLE default; --",
            "two words",
            "dash-ed",
            "dot.ted",
            "quote\"",
            "semi;",
            "ünicode",
            "tab\t",
        ] {
            assert!(
                matches!(validate_identifier(name), Err(VaultError::InvalidIdentifier(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_identifier() {
        let name = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_identifier(&name).is_err());
    }
}
