use std::sync::Arc;

use anyhow::Result;
use logging::warn_with_head;
use prometheus_metrics::Metrics;
use std_ext::ArcExt as _;
use types::{
    combined::ExecutionPayload,
    phase0::primitives::{PublicKeyBytes, Slot, ValidatorIndex},
    unphased::containers::SignedValidatorRegistrationV1,
};

use crate::{
    chain_state::ChainStateSource,
    config::Config,
    error::Error,
    keys::GetPayloadResponseKey,
    known_validators::{KnownValidators, RefreshOutcome},
    payloads::PayloadLookup,
    registrations::RegistrationCoordinator,
    storage::{DurableStore, PayloadCache, RelayCache},
};

/// Entry point used by the relay API.
///
/// Holds the known validator set and routes registration writes and payload reads across
/// the cache tiers and the durable store.
pub struct Datastore {
    known_validators: KnownValidators,
    registrations: RegistrationCoordinator,
    payloads: PayloadLookup,
    payload_retention_slots: u64,
}

impl Datastore {
    /// `cache` is the primary fast cache. `secondary_cache` is only queried for payloads.
    #[must_use]
    pub fn new<C: RelayCache + 'static>(
        config: Arc<Config>,
        chain_state_source: Arc<dyn ChainStateSource>,
        cache: Arc<C>,
        secondary_cache: Option<Arc<dyn PayloadCache>>,
        durable_store: Arc<dyn DurableStore>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        let payload_retention_slots = config.payload_retention_slots;
        let primary_cache: Arc<dyn PayloadCache> = cache.clone_arc();

        let caches = core::iter::once(primary_cache)
            .chain(secondary_cache)
            .collect();

        Self {
            known_validators: KnownValidators::new(
                config,
                chain_state_source,
                cache.clone_arc(),
                metrics.clone(),
            ),
            registrations: RegistrationCoordinator::new(
                durable_store.clone_arc(),
                cache,
                metrics.clone(),
            ),
            payloads: PayloadLookup::new(caches, durable_store, metrics),
            payload_retention_slots,
        }
    }

    /// Runs the per-slot maintenance: refreshes the known validators if due and drops cached
    /// payloads that fell out of the retention window.
    pub async fn refresh_known_validators(&self, slot: Slot) -> RefreshOutcome {
        let outcome = self.known_validators.refresh(slot).await;

        if let Some(oldest_retained) = slot.checked_sub(self.payload_retention_slots) {
            self.payloads.prune_before(oldest_retained).await;
        }

        outcome
    }

    #[must_use]
    pub fn is_known_validator(&self, pubkey: PublicKeyBytes) -> bool {
        self.known_validators.is_known_validator(pubkey)
    }

    #[must_use]
    pub fn known_validator_pubkey_by_index(&self, index: ValidatorIndex) -> Option<PublicKeyBytes> {
        self.known_validators.pubkey_by_index(index)
    }

    #[must_use]
    pub fn num_known_validators(&self) -> usize {
        self.known_validators.len()
    }

    pub async fn save_validator_registration(
        &self,
        registration: &SignedValidatorRegistrationV1,
    ) -> Result<()> {
        self.registrations.save(registration).await
    }

    /// Looks up the payload for a `getPayload` request.
    ///
    /// `proposer_pubkey` and `block_hash` are hexadecimal in any case, with or without `0x`.
    /// A request that does not parse cannot match any stored payload and is
    /// [`Error::ExecutionPayloadNotFound`] without querying any tier.
    pub async fn get_payload_response(
        &self,
        slot: Slot,
        proposer_pubkey: &str,
        block_hash: &str,
    ) -> Result<ExecutionPayload> {
        let key = match GetPayloadResponseKey::parse(slot, proposer_pubkey, block_hash) {
            Ok(key) => key,
            Err(error) => {
                warn_with_head!("malformed execution payload request (slot: {slot}): {error:?}");
                return Err(error.context(Error::ExecutionPayloadNotFound));
            }
        };

        self.payloads.execution_payload(&key).await
    }

    pub async fn num_registered_validators(&self) -> Result<u64> {
        self.registrations.num_registered_validators().await
    }

    pub fn track_collection_metrics(&self, metrics: &Metrics) {
        self.known_validators.track_collection_metrics(metrics);
    }
}
