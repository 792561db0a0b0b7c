// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vault service: store, transit cipher and gate behind one handle.
//!
//! Built once at startup and shared by every request handler.

use std::sync::Arc;

use serde_json::{Map, Value};
use vaultapi_core::{PutOutcome, VaultError};
use vaultapi_storage::SecretStore;
use vaultapi_transit::TransitCipher;

use crate::gate::AccessGate;

/// Explicit context for all secret operations.
#[derive(Debug)]
pub struct VaultService {
    store: SecretStore,
    cipher: TransitCipher,
    transit_enabled: bool,
    gate: Arc<AccessGate>,
}

impl VaultService {
    /// `transit_enabled` controls whether read results leave the service
    /// encrypted; `/decrypt` works either way.
    pub fn new(
        store: SecretStore,
        cipher: TransitCipher,
        transit_enabled: bool,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            store,
            cipher,
            transit_enabled,
            gate,
        }
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    pub fn gate(&self) -> &Arc<AccessGate> {
        &self.gate
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<(), VaultError> {
        self.gate.authenticate(token)
    }

    pub fn admit(&self, client_id: &str) -> Result<(), VaultError> {
        self.gate.admit(client_id)
    }

    pub async fn create_table(&self, table: &str) -> Result<(), VaultError> {
        self.store.create_table(table).await
    }

    /// The secret under `key`, as it goes on the wire.
    ///
    /// With transit enabled this is the envelope of `{key: value}`; otherwise
    /// the bare value. `Ok(None)` when the key is absent.
    pub async fn get_secret(&self, table: &str, key: &str) -> Result<Option<String>, VaultError> {
        let Some(value) = self.store.get(table, key).await? else {
            tracing::info!(table = %table, key = %key, "secret not found");
            return Ok(None);
        };
        tracing::info!(table = %table, key = %key, "secret retrieved");
        if !self.transit_enabled {
            return Ok(Some(value));
        }
        let mut payload = Map::new();
        payload.insert(key.to_string(), Value::String(value));
        self.encrypt_transit(&Value::Object(payload)).map(Some)
    }

    pub async fn put_secret(
        &self,
        table: &str,
        key: &str,
        value: &str,
    ) -> Result<PutOutcome, VaultError> {
        self.store.put(table, key, value).await
    }

    /// Remove `key`. `Ok(false)` when it was not there.
    pub async fn delete_secret(&self, table: &str, key: &str) -> Result<bool, VaultError> {
        let removed = self.store.delete(table, key).await?;
        if removed {
            tracing::info!(table = %table, key = %key, "secret removed");
        } else {
            tracing::warn!(table = %table, key = %key, "secret to delete not found");
        }
        Ok(removed)
    }

    /// The whole namespace as a JSON object, or its transit envelope.
    pub async fn get_table(&self, table: &str) -> Result<Value, VaultError> {
        let records = self.store.get_table(table).await?;
        tracing::info!(table = %table, count = records.len(), "table retrieved");
        let object: Map<String, Value> = records
            .into_iter()
            .map(|r| (r.key, Value::String(r.value)))
            .collect();
        let object = Value::Object(object);
        if self.transit_enabled {
            self.encrypt_transit(&object).map(Value::String)
        } else {
            Ok(object)
        }
    }

    pub fn encrypt_transit(&self, payload: &Value) -> Result<String, VaultError> {
        self.cipher.encrypt_transit(payload)
    }

    pub fn decrypt_transit(&self, text: &str) -> Result<Value, VaultError> {
        self.cipher.decrypt_transit(text)
    }
}
