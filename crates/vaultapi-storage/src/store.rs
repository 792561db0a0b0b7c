// SPDX-FileCopyrightText: 2026 vaultapi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespaced key/value secret storage.
//!
//! Each namespace is its own SQLite table `(key TEXT PRIMARY KEY, value TEXT)`.
//! Table names pass [`validate_identifier`] before they reach SQL text.

use rusqlite::params;
use tracing::{debug, info};
use vaultapi_core::{PutOutcome, SecretRecord, VaultError};

use crate::database::{map_tr_err, Database};
use crate::identifier::validate_identifier;

/// Secret store over a single [`Database`].
#[derive(Debug, Clone)]
pub struct SecretStore {
    db: Database,
}

impl SecretStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create a namespace. Creating one that already exists is a no-op.
    pub async fn create_table(&self, table: &str) -> Result<(), VaultError> {
        validate_identifier(table)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" \
             (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)"
        );
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(&sql, [])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        info!(table = %table, "table ready");
        Ok(())
    }

    /// Look up the value stored under `key`. An absent key is `Ok(None)`.
    pub async fn get(&self, table: &str, key: &str) -> Result<Option<String>, VaultError> {
        validate_identifier(table)?;
        let sql = format!("SELECT value FROM \"{table}\" WHERE key = ?1");
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(&sql, params![key], |row| row.get::<_, String>(0));
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Delete and insert run in one transaction, so a key never holds two
    /// values even if the table was created without a primary key.
    pub async fn put(&self, table: &str, key: &str, value: &str) -> Result<PutOutcome, VaultError> {
        validate_identifier(table)?;
        let delete_sql = format!("DELETE FROM \"{table}\" WHERE key = ?1");
        let insert_sql = format!("INSERT INTO \"{table}\" (key, value) VALUES (?1, ?2)");
        let key_owned = key.to_string();
        let value = value.to_string();

        let outcome = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let removed = tx.execute(&delete_sql, params![key_owned])?;
                tx.execute(&insert_sql, params![key_owned, value])?;
                tx.commit()?;
                Ok(if removed > 0 {
                    PutOutcome::Overwritten
                } else {
                    PutOutcome::Inserted
                })
            })
            .await
            .map_err(map_tr_err)?;

        match outcome {
            PutOutcome::Overwritten => info!(table = %table, key = %key, "secret overwritten"),
            PutOutcome::Inserted => info!(table = %table, key = %key, "secret stored"),
        }
        Ok(outcome)
    }

    /// Remove `key`. Returns whether anything was removed.
    pub async fn delete(&self, table: &str, key: &str) -> Result<bool, VaultError> {
        validate_identifier(table)?;
        let sql = format!("DELETE FROM \"{table}\" WHERE key = ?1");
        let key_owned = key.to_string();
        let removed = self
            .db
            .connection()
            .call(move |conn| conn.execute(&sql, params![key_owned]))
            .await
            .map_err(map_tr_err)?;
        debug!(table = %table, key = %key, removed, "delete");
        Ok(removed > 0)
    }

    /// Every record in the namespace, ordered by key.
    pub async fn get_table(&self, table: &str) -> Result<Vec<SecretRecord>, VaultError> {
        validate_identifier(table)?;
        let sql = format!("SELECT key, value FROM \"{table}\" ORDER BY key");
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], |row| {
                    Ok(SecretRecord {
                        key: row.get(0)?,
                        value: row.get(1)?,
                    })
                })?;
                let records = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Names of all user tables, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>, VaultError> {
        self.db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let names = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(map_tr_err)
    }
}
