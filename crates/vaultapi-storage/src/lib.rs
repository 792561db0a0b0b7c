// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the vaultapi secret store.
//!
//! Secrets live in named namespaces, one SQLite table each. All access goes
//! through a single `tokio-rusqlite` background thread, so writes are
//! serialized without additional locking.

pub mod database;
pub mod identifier;
pub mod store;

pub use database::Database;
pub use identifier::{validate_identifier, MAX_IDENTIFIER_LEN};
pub use store::SecretStore;
