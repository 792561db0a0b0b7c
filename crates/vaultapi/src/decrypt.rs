// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vaultapi decrypt` command implementation.
//!
//! Client-side helper: derives the transit key for the current time bucket
//! from the API key, exactly as the server does, and opens an envelope that
//! `/get-secret` or `/get-table` returned.

use clap::Args;
use secrecy::SecretString;
use serde_json::Value;
use vaultapi_core::VaultError;
use vaultapi_transit::{KeyLength, TransitCipher, DEFAULT_BUCKET_WIDTH_SECS};

/// Arguments for `vaultapi decrypt`.
#[derive(Args, Clone)]
pub struct DecryptArgs {
    /// Base64 transit envelope to decrypt.
    pub ciphertext: String,

    /// API key shared with the server.
    #[arg(long, env = "VAULTAPI_APIKEY", hide_env_values = true)]
    pub apikey: String,

    /// Width of a key-derivation time bucket in seconds.
    #[arg(long, env = "VAULTAPI_TRANSIT_BUCKET_WIDTH_SECS", default_value_t = DEFAULT_BUCKET_WIDTH_SECS)]
    pub bucket_width_secs: u64,

    /// AES key length in bytes: 16, 24 or 32.
    #[arg(long, env = "VAULTAPI_TRANSIT_KEY_LENGTH", default_value_t = 32)]
    pub key_length: usize,

    /// Also try the previous bucket's key.
    #[arg(long)]
    pub tolerate_previous_bucket: bool,

    /// Standard base64 static key. Overrides derivation when set.
    #[arg(long, env = "VAULTAPI_TRANSIT_STATIC_KEY", hide_env_values = true)]
    pub static_key: Option<String>,
}

impl std::fmt::Debug for DecryptArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptArgs")
            .field("ciphertext", &self.ciphertext)
            .field("apikey", &"[redacted]")
            .field("bucket_width_secs", &self.bucket_width_secs)
            .field("key_length", &self.key_length)
            .field("tolerate_previous_bucket", &self.tolerate_previous_bucket)
            .field("static_key", &self.static_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl DecryptArgs {
    fn cipher(&self) -> Result<TransitCipher, VaultError> {
        match &self.static_key {
            Some(encoded) => TransitCipher::from_static_base64(encoded),
            None => TransitCipher::derived(
                SecretString::from(self.apikey.clone()),
                self.bucket_width_secs,
                KeyLength::new(self.key_length)?,
                self.tolerate_previous_bucket,
            ),
        }
    }
}

/// Decrypt `args.ciphertext` with the key for the current bucket.
pub fn run_decrypt(args: &DecryptArgs) -> Result<Value, VaultError> {
    args.cipher()?.decrypt_transit(&args.ciphertext)
}
