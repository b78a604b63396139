//! Embedded SQLite implementation of [`DurableStore`].

use std::{path::Path, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use datastore::{DurableStore, ExecutionPayloadEntry, GetPayloadResponseKey};
use logging::{debug_with_head, info_with_head};
use parking_lot::Mutex;
use rusqlite::{types::Type, Connection, Error as SqliteError, OptionalExtension as _, Row};
use serde::de::DeserializeOwned;
use std_ext::ArcExt as _;
use types::{
    combined::ExecutionPayload,
    phase0::primitives::{PublicKeyBytes, Slot},
    unphased::containers::{SignedValidatorRegistrationV1, ValidatorRegistrationV1},
};

#[allow(clippy::str_to_string)]
mod schema {
    use refinery::embed_migrations;
    embed_migrations!();
}

const DB_PATH: &str = "relay_datastore.sqlite";

pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn persistent(store_directory: impl AsRef<Path>) -> Result<Self> {
        let store_directory = store_directory.as_ref();
        let path = store_directory.join(DB_PATH);

        if !path.try_exists()? {
            fs_err::create_dir_all(store_directory)?;
        }

        let mut connection = Connection::open(&path)?;
        schema::migrations::runner().run(&mut connection)?;
        Self::set_shared_pragma(&connection)?;

        connection.pragma_update(None, "journal_mode", "WAL")?;

        info_with_head!("opened durable store at {}", path.display());

        Ok(Self::new(connection))
    }

    pub fn in_memory() -> Result<Self> {
        let mut connection = Connection::open_in_memory()?;
        schema::migrations::runner().run(&mut connection)?;
        Self::set_shared_pragma(&connection)?;

        // See the last paragraph of <https://www.sqlite.org/pragma.html#pragma_journal_mode>.
        connection.pragma_update(None, "journal_mode", "MEMORY")?;

        Ok(Self::new(connection))
    }

    fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn set_shared_pragma(connection: &Connection) -> Result<()> {
        // Wait for other connections to the same file instead of failing with `SQLITE_BUSY`.
        connection.busy_timeout(core::time::Duration::from_secs(5))?;

        // See <https://sqlite.org/pragma.html#pragma_cache_size>.
        connection.pragma_update(None, "cache_size", -20000)?;

        Ok(())
    }

    /// Stores a payload submitted by a builder.
    ///
    /// Returns `false` if a payload was already stored under the same key.
    /// Stored payloads are never replaced.
    pub async fn save_execution_payload(
        &self,
        slot: Slot,
        proposer_pubkey: PublicKeyBytes,
        payload: &ExecutionPayload,
    ) -> Result<bool> {
        let block_hash = payload.block_hash();
        let version = serde_json::to_string(&payload.phase())?;

        let payload = match payload {
            ExecutionPayload::Bellatrix(payload) => serde_json::to_string(payload)?,
            ExecutionPayload::Capella(payload) => serde_json::to_string(payload)?,
        };

        let rows_changed = self
            .run(move |connection| {
                connection
                    .execute(
                        "INSERT OR IGNORE INTO execution_payloads \
                         (slot, proposer_pubkey, block_hash, version, payload) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        (
                            slot,
                            format!("{proposer_pubkey:#x}"),
                            format!("{block_hash:#x}"),
                            version,
                            payload,
                        ),
                    )
                    .map_err(Into::into)
            })
            .await?;

        debug_with_head!(
            "saved execution payload \
             (slot: {slot}, proposer_pubkey: {proposer_pubkey:?}, block_hash: {block_hash:?}, \
             stored: {})",
            rows_changed > 0,
        );

        Ok(rows_changed > 0)
    }

    /// Returns the most recent registration of `pubkey` by its own timestamp.
    pub async fn latest_validator_registration(
        &self,
        pubkey: PublicKeyBytes,
    ) -> Result<Option<SignedValidatorRegistrationV1>> {
        self.run(move |connection| {
            connection
                .query_row(
                    "SELECT pubkey, fee_recipient, gas_limit, timestamp, signature \
                     FROM validator_registrations \
                     WHERE pubkey = ?1 \
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    [format!("{pubkey:#x}")],
                    |row| {
                        Ok(SignedValidatorRegistrationV1 {
                            message: ValidatorRegistrationV1 {
                                pubkey: hex_column(row, 0)?,
                                fee_recipient: hex_column(row, 1)?,
                                gas_limit: row.get(2)?,
                                timestamp: row.get(3)?,
                            },
                            signature: hex_column(row, 4)?,
                        })
                    },
                )
                .optional()
                .map_err(Into::into)
        })
        .await
    }

    // `rusqlite` calls block, so they are moved off the async worker threads.
    async fn run<T: Send + 'static>(
        &self,
        query: impl FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    ) -> Result<T> {
        let connection = self.connection.clone_arc();
        tokio::task::spawn_blocking(move || query(&mut connection.lock())).await?
    }
}

// Hash columns hold the same `0x`-prefixed lowercase hex the types serialize to.
fn hex_column<T: DeserializeOwned>(row: &Row, index: usize) -> rusqlite::Result<T> {
    let hex = row.get::<_, String>(index)?;

    serde_json::from_value(hex.into())
        .map_err(|error| SqliteError::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn save_validator_registration(
        &self,
        registration: &SignedValidatorRegistrationV1,
    ) -> Result<()> {
        let SignedValidatorRegistrationV1 { message, signature } = *registration;

        self.run(move |connection| {
            connection.execute(
                "INSERT OR IGNORE INTO validator_registrations \
                 (pubkey, fee_recipient, gas_limit, timestamp, signature) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    format!("{:#x}", message.pubkey),
                    format!("{:#x}", message.fee_recipient),
                    message.gas_limit,
                    message.timestamp,
                    format!("{signature:#x}"),
                ),
            )?;

            Ok(())
        })
        .await
    }

    async fn execution_payload_entry(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayloadEntry>> {
        let GetPayloadResponseKey {
            slot,
            proposer_pubkey,
            block_hash,
        } = *key;

        self.run(move |connection| {
            connection
                .query_row(
                    "SELECT version, payload FROM execution_payloads \
                     WHERE slot = ?1 AND proposer_pubkey = ?2 AND block_hash = ?3",
                    (
                        slot,
                        format!("{proposer_pubkey:#x}"),
                        format!("{block_hash:#x}"),
                    ),
                    |row| {
                        Ok(ExecutionPayloadEntry {
                            version: row.get(0)?,
                            payload: row.get(1)?,
                        })
                    },
                )
                .optional()
                .map_err(Into::into)
        })
        .await
    }

    async fn num_registered_validators(&self) -> Result<u64> {
        self.run(|connection| {
            connection
                .query_row(
                    "SELECT COUNT(DISTINCT pubkey) FROM validator_registrations",
                    (),
                    |row| row.get(0),
                )
                .map_err(Into::into)
        })
        .await
    }
}
