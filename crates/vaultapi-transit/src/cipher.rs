// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-GCM seal/open over the transit envelope.
//!
//! Envelope layout is `nonce(12) || ciphertext || tag(16)` with empty
//! associated data. The AES variant (128/192/256) follows the key length.
//! Every call to [`seal`] draws a fresh 96-bit nonce from the system CSPRNG.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use ring::rand::{SecureRandom, SystemRandom};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vaultapi_core::VaultError;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<aes_gcm::aes::Aes192, U12>;

/// Encrypt `plaintext` under `key`, returning the full envelope.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| VaultError::Internal("failed to generate random nonce".to_string()))?;

    let sealed = match key.len() {
        16 => seal_with::<Aes128Gcm>(key, &nonce, plaintext)?,
        24 => seal_with::<Aes192Gcm>(key, &nonce, plaintext)?,
        32 => seal_with::<Aes256Gcm>(key, &nonce, plaintext)?,
        other => return Err(unsupported_key(other)),
    };

    let mut envelope = Vec::with_capacity(NONCE_LEN + sealed.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`seal`].
///
/// Any tag mismatch (wrong key, truncated or tampered data) is reported as
/// [`VaultError::Authentication`]; no partial plaintext is ever returned.
pub fn open(key: &[u8], envelope: &[u8]) -> Result<Vec<u8>, VaultError> {
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::Authentication);
    }
    let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);

    match key.len() {
        16 => open_with::<Aes128Gcm>(key, nonce, ciphertext),
        24 => open_with::<Aes192Gcm>(key, nonce, ciphertext),
        32 => open_with::<Aes256Gcm>(key, nonce, ciphertext),
        other => Err(unsupported_key(other)),
    }
}

/// JSON-serialize `payload` and seal it.
pub fn encrypt<T: Serialize + ?Sized>(payload: &T, key: &[u8]) -> Result<Vec<u8>, VaultError> {
    let plaintext = serde_json::to_vec(payload)
        .map_err(|e| VaultError::Internal(format!("failed to serialize payload: {e}")))?;
    seal(key, &plaintext)
}

/// Open an envelope and deserialize the JSON plaintext.
pub fn decrypt<T: DeserializeOwned>(envelope: &[u8], key: &[u8]) -> Result<T, VaultError> {
    let plaintext = open(key, envelope)?;
    serde_json::from_slice(&plaintext).map_err(|e| VaultError::MalformedPayload(e.to_string()))
}

fn seal_with<C>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, VaultError>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| unsupported_key(key.len()))?;
    cipher
        .encrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| VaultError::Internal("AES-GCM encryption failed".to_string()))
}

fn open_with<C>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError>
where
    C: KeyInit + Aead + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| unsupported_key(key.len()))?;
    cipher
        .decrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::Authentication)
}

fn unsupported_key(len: usize) -> VaultError {
    VaultError::Config(format!(
        "unsupported AES key length {len}: expected 16, 24 or 32 bytes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn key(len: usize) -> Vec<u8> {
        (0..len as u8).collect()
    }

    #[test]
    fn seal_open_roundtrip_for_every_key_size() {
        for len in [16, 24, 32] {
            let k = key(len);
            let envelope = seal(&k, b"secret api key value").unwrap();
            assert_eq!(open(&k, &envelope).unwrap(), b"secret api key value");
        }
    }

    #[test]
    fn envelope_is_nonce_plus_plaintext_plus_tag() {
        let envelope = seal(&key(32), b"hello").unwrap();
        assert_eq!(envelope.len(), NONCE_LEN + 5 + TAG_LEN);
    }

    #[test]
    fn seal_uses_fresh_nonce_each_time() {
        let k = key(32);
        let a = seal(&k, b"same input twice").unwrap();
        let b = seal(&k, b"same input twice").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn open_with_wrong_key_is_authentication_error() {
        let envelope = seal(&key(32), b"secret data").unwrap();
        let mut other = key(32);
        other[0] ^= 0xff;
        assert!(matches!(
            open(&other, &envelope),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn short_envelope_is_rejected_before_decryption() {
        let k = key(16);
        assert!(matches!(open(&k, &[]), Err(VaultError::Authentication)));
        assert!(matches!(
            open(&k, &[0u8; NONCE_LEN + TAG_LEN - 1]),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn unsupported_key_length_is_config_error() {
        assert!(matches!(seal(&key(20), b"x"), Err(VaultError::Config(_))));
        assert!(matches!(
            open(&key(20), &[0u8; 40]),
            Err(VaultError::Config(_))
        ));
    }

    #[test]
    fn encrypt_decrypt_json_payload() {
        let k = key(32);
        let payload = json!({"db_password": "hunter2"});
        let envelope = encrypt(&payload, &k).unwrap();
        let back: Value = decrypt(&envelope, &k).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn decrypt_non_json_plaintext_is_malformed_payload() {
        let k = key(32);
        let envelope = seal(&k, b"not json {").unwrap();
        assert!(matches!(
            decrypt::<Value>(&envelope, &k),
            Err(VaultError::MalformedPayload(_))
        ));
    }

    proptest! {
        #[test]
        fn encrypt_decrypt_roundtrip(k in proptest::collection::vec(any::<u8>(), 32), name in "[a-z_]{1,16}", value in ".{0,128}") {
            let mut map = serde_json::Map::new();
            map.insert(name, Value::String(value));
            let payload = Value::Object(map);
            let envelope = encrypt(&payload, &k).unwrap();
            let back: Value = decrypt(&envelope, &k).unwrap();
            prop_assert_eq!(back, payload);
        }

        // Covers nonce, ciphertext and tag: any single flipped bit must fail.
        #[test]
        fn any_flipped_bit_is_authentication_error(
            len in prop::sample::select(vec![16usize, 24, 32]),
            plaintext in proptest::collection::vec(any::<u8>(), 0..64),
            bit in any::<prop::sample::Index>(),
        ) {
            let k = key(len);
            let mut envelope = seal(&k, &plaintext).unwrap();
            let bit = bit.index(envelope.len() * 8);
            envelope[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(matches!(open(&k, &envelope), Err(VaultError::Authentication)));
        }
    }

    #[test]
    fn every_bit_of_a_fixed_envelope_is_authenticated() {
        let k = key(24);
        let envelope = seal(&k, b"do not tamper").unwrap();
        for bit in 0..envelope.len() * 8 {
            let mut tampered = envelope.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            assert!(
                matches!(open(&k, &tampered), Err(VaultError::Authentication)),
                "bit {bit} was not authenticated"
            );
        }
    }
}
