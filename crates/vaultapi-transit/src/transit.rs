// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transit cipher: encrypts payloads for the wire under a key both ends can
//! derive from the shared credential and the current time bucket.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use vaultapi_core::VaultError;
use zeroize::Zeroizing;

use crate::cipher;
use crate::kdf::{self, KeyLength};

/// Where the transit key comes from.
pub enum KeySource {
    /// Derived per time bucket from the credential.
    Derived {
        credential: SecretString,
        bucket_width_secs: u64,
        key_length: KeyLength,
        /// Also accept envelopes sealed in the bucket before the current one.
        tolerate_previous_bucket: bool,
    },
    /// A pre-shared key used for every envelope.
    Static(Zeroizing<Vec<u8>>),
}

/// Encrypts and decrypts transit envelopes.
///
/// Keys are produced inside a single call and dropped (zeroized) before it
/// returns; only the credential or static key lives for the cipher's lifetime.
pub struct TransitCipher {
    source: KeySource,
}

impl std::fmt::Debug for TransitCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            KeySource::Derived {
                bucket_width_secs,
                key_length,
                tolerate_previous_bucket,
                ..
            } => f
                .debug_struct("TransitCipher")
                .field("source", &"derived")
                .field("credential", &"[redacted]")
                .field("bucket_width_secs", bucket_width_secs)
                .field("key_length", &key_length.bytes())
                .field("tolerate_previous_bucket", tolerate_previous_bucket)
                .finish(),
            KeySource::Static(_) => f
                .debug_struct("TransitCipher")
                .field("source", &"static")
                .field("key", &"[redacted]")
                .finish(),
        }
    }
}

impl TransitCipher {
    /// Cipher deriving a fresh key per `bucket_width_secs` window.
    pub fn derived(
        credential: SecretString,
        bucket_width_secs: u64,
        key_length: KeyLength,
        tolerate_previous_bucket: bool,
    ) -> Result<Self, VaultError> {
        // Reject a zero width up front instead of on the first request.
        kdf::time_bucket(0, bucket_width_secs)?;
        Ok(Self {
            source: KeySource::Derived {
                credential,
                bucket_width_secs,
                key_length,
                tolerate_previous_bucket,
            },
        })
    }

    /// Cipher using a fixed key of 16, 24 or 32 bytes.
    pub fn with_static_key(key: Zeroizing<Vec<u8>>) -> Result<Self, VaultError> {
        KeyLength::new(key.len())?;
        Ok(Self {
            source: KeySource::Static(key),
        })
    }

    /// Cipher using a fixed key given as standard base64.
    pub fn from_static_base64(encoded: &str) -> Result<Self, VaultError> {
        let key = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| VaultError::Config("static transit key is not valid base64".into()))?,
        );
        Self::with_static_key(key)
    }

    /// Encrypt `payload` for the current time bucket, as base64 text.
    pub fn encrypt_transit<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, VaultError> {
        self.encrypt_transit_at(payload, now_unix())
    }

    /// Encrypt `payload` as if the clock read `unix_secs`.
    pub fn encrypt_transit_at<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        unix_secs: i64,
    ) -> Result<String, VaultError> {
        let key = self.encryption_key(unix_secs)?;
        let envelope = cipher::encrypt(payload, &key)?;
        Ok(STANDARD.encode(envelope))
    }

    /// Decrypt base64 envelope text sealed in the current time bucket.
    pub fn decrypt_transit(&self, text: &str) -> Result<Value, VaultError> {
        self.decrypt_transit_at(text, now_unix())
    }

    /// Decrypt base64 envelope text as if the clock read `unix_secs`.
    ///
    /// Invalid base64 is a [`VaultError::MalformedPayload`]. An envelope that
    /// no acceptable key opens is a [`VaultError::Authentication`].
    pub fn decrypt_transit_at(&self, text: &str, unix_secs: i64) -> Result<Value, VaultError> {
        let envelope = STANDARD
            .decode(text.trim())
            .map_err(|e| VaultError::MalformedPayload(format!("invalid base64: {e}")))?;

        match &self.source {
            KeySource::Static(key) => cipher::decrypt(&envelope, key),
            KeySource::Derived {
                credential,
                bucket_width_secs,
                key_length,
                tolerate_previous_bucket,
            } => {
                let bucket = kdf::time_bucket(unix_secs, *bucket_width_secs)?;
                let current = kdf::derive_key(credential.expose_secret(), bucket, *key_length);
                match cipher::decrypt(&envelope, &current) {
                    Err(VaultError::Authentication) if *tolerate_previous_bucket => {
                        // The earliest representable bucket has no predecessor.
                        let prev_bucket = bucket
                            .checked_sub(1)
                            .ok_or(VaultError::Authentication)?;
                        let previous =
                            kdf::derive_key(credential.expose_secret(), prev_bucket, *key_length);
                        let value = cipher::decrypt(&envelope, &previous)?;
                        debug!(bucket = prev_bucket, "envelope accepted under previous bucket");
                        Ok(value)
                    }
                    other => other,
                }
            }
        }
    }

    fn encryption_key(&self, unix_secs: i64) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        match &self.source {
            KeySource::Static(key) => Ok(key.clone()),
            KeySource::Derived {
                credential,
                bucket_width_secs,
                key_length,
                ..
            } => {
                let bucket = kdf::time_bucket(unix_secs, *bucket_width_secs)?;
                Ok(kdf::derive_key(credential.expose_secret(), bucket, *key_length))
            }
        }
    }
}

/// Current Unix time in whole seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
