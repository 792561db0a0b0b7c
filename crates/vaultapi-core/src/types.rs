// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the store, the gate and the HTTP boundary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Name of the table created at startup and used when a request names none.
pub const DEFAULT_TABLE: &str = "default";

/// Outcome classification rendered by the service boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    Ok,
    NotFound,
    Unauthorized,
    RateLimited,
    BadRequest,
    ServerError,
}

/// A single `(key, value)` row of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub key: String,
    pub value: String,
}

/// What a `put` did to the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No record existed for the key.
    Inserted,
    /// An existing value was replaced.
    Overwritten,
}
