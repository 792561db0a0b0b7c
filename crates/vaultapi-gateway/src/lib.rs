// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP service boundary and access gate for the vaultapi secret store.
//!
//! Requests to every route except `/health` pass bearer authentication and
//! then per-client admission control before reaching the [`VaultService`].

pub mod admission;
pub mod auth;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod server;
pub mod service;

pub use admission::{RateLimitRule, RateLimiter};
pub use auth::Authenticator;
pub use error::ApiError;
pub use gate::{run_pruner, AccessGate};
pub use server::{router, start_server, ServerConfig};
pub use service::VaultService;
