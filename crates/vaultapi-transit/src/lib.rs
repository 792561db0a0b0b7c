// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transit encryption for the vaultapi secret store.
//!
//! Secrets leave the server sealed with AES-GCM under a key derived from the
//! shared API credential and the current time bucket, so a captured response
//! is useless to anyone without the credential and stops opening once the
//! bucket rolls over.

pub mod cipher;
pub mod kdf;
pub mod transit;

pub use kdf::{derive_key, time_bucket, KeyLength, DEFAULT_BUCKET_WIDTH_SECS};
pub use transit::{now_unix, KeySource, TransitCipher};
