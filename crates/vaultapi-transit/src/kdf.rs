// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-windowed key derivation from the API credential.
//!
//! The transit key for a time bucket is the leading `key_length` bytes of
//! `SHA-256("{bucket}.{credential}")`. Server and client derive the same key
//! independently as long as they agree on the bucket.

use sha2::{Digest, Sha256};
use vaultapi_core::VaultError;
use zeroize::Zeroizing;

/// Default width of a time bucket in seconds.
pub const DEFAULT_BUCKET_WIDTH_SECS: u64 = 60;

/// A validated AES key length: 16, 24 or 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyLength(usize);

impl KeyLength {
    pub const AES_128: KeyLength = KeyLength(16);
    pub const AES_192: KeyLength = KeyLength(24);
    pub const AES_256: KeyLength = KeyLength(32);

    /// Accepts only the AES key sizes.
    pub fn new(bytes: usize) -> Result<Self, VaultError> {
        match bytes {
            16 | 24 | 32 => Ok(KeyLength(bytes)),
            other => Err(VaultError::Config(format!(
                "unsupported AES key length {other}: expected 16, 24 or 32 bytes"
            ))),
        }
    }

    pub fn bytes(self) -> usize {
        self.0
    }
}

impl Default for KeyLength {
    fn default() -> Self {
        KeyLength::AES_256
    }
}

/// Index of the time bucket containing `unix_secs`.
///
/// Floor division, so timestamps before the epoch land in negative buckets
/// rather than collapsing onto bucket zero.
pub fn time_bucket(unix_secs: i64, width_secs: u64) -> Result<i64, VaultError> {
    if width_secs == 0 {
        return Err(VaultError::Config(
            "time bucket width must be at least one second".to_string(),
        ));
    }
    let width = i64::try_from(width_secs).map_err(|_| {
        VaultError::Config(format!("time bucket width {width_secs}s is out of range"))
    })?;
    Ok(unix_secs.div_euclid(width))
}

/// Derive the AES key for `bucket` from `credential`.
///
/// Deterministic: equal inputs always yield equal keys. The returned key is
/// wrapped in [`Zeroizing`] and wiped on drop.
pub fn derive_key(credential: &str, bucket: i64, key_length: KeyLength) -> Zeroizing<Vec<u8>> {
    let input = Zeroizing::new(format!("{bucket}.{credential}"));
    let digest = Zeroizing::new(<[u8; 32]>::from(Sha256::digest(input.as_bytes())));
    Zeroizing::new(digest[..key_length.bytes()].to_vec())
}
