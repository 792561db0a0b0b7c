// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the vaultapi secret store.
//!
//! Holds the error taxonomy every other crate returns, and the small set of
//! types that cross crate boundaries.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VaultError;
pub use types::{PutOutcome, SecretRecord, StatusClass, DEFAULT_TABLE};
