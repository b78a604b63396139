//! Interfaces of the storage tiers behind the datastore.
//!
//! Concrete clients (Redis, Memcached, Postgres and the like) live outside this crate.
//! Every method may fail with a transient error. Misses are `Ok(None)`, never errors.

use anyhow::Result;
use async_trait::async_trait;
use types::{
    combined::ExecutionPayload,
    phase0::primitives::{PublicKeyBytes, Slot, UnixSeconds},
    unphased::containers::SignedValidatorRegistrationV1,
};

use crate::keys::GetPayloadResponseKey;

pub const STATS_FIELD_VALIDATORS_TOTAL: &str = "validators-total";

/// A raw execution payload row as stored in the durable store.
///
/// `version` is a JSON-encoded protocol version (`"capella"` including the quotes).
/// `payload` is the JSON-encoded payload in the shape of that version.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExecutionPayloadEntry {
    pub version: String,
    pub payload: String,
}

#[async_trait]
pub trait PayloadCache: Send + Sync {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn execution_payload(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayload>>;

    /// Drops payloads of slots before `slot` and returns how many were dropped.
    ///
    /// Tiers that expire entries on their own keep the default.
    async fn prune_execution_payloads_before(&self, _slot: Slot) -> Result<usize> {
        Ok(0)
    }
}

/// The primary fast cache. Besides payloads it holds registration timestamps and stats.
#[async_trait]
pub trait RelayCache: PayloadCache {
    /// Replaces the stored timestamp only if `timestamp` is strictly greater.
    ///
    /// Implementations must make the comparison and the write atomic with respect to
    /// other relay instances sharing the cache.
    async fn set_validator_registration_timestamp_if_newer(
        &self,
        pubkey: PublicKeyBytes,
        timestamp: UnixSeconds,
    ) -> Result<()>;

    async fn set_stat(&self, field: &str, value: &str) -> Result<()>;
}

/// The system of record.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn save_validator_registration(
        &self,
        registration: &SignedValidatorRegistrationV1,
    ) -> Result<()>;

    async fn execution_payload_entry(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayloadEntry>>;

    async fn num_registered_validators(&self) -> Result<u64>;
}
