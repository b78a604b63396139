use std::sync::Arc;

use anyhow::{Context as _, Result};
use logging::{debug_with_head, error_with_head};
use prometheus_metrics::Metrics;
use types::unphased::containers::SignedValidatorRegistrationV1;

use crate::{
    error::Error,
    storage::{DurableStore, RelayCache},
};

pub struct RegistrationCoordinator {
    durable_store: Arc<dyn DurableStore>,
    cache: Arc<dyn RelayCache>,
    metrics: Option<Arc<Metrics>>,
}

impl RegistrationCoordinator {
    #[must_use]
    pub fn new(
        durable_store: Arc<dyn DurableStore>,
        cache: Arc<dyn RelayCache>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            durable_store,
            cache,
            metrics,
        }
    }

    /// Persists `registration` and then advances the cached registration timestamp.
    ///
    /// The durable store is written first. If that fails the cache is not touched and the
    /// returned error downcasts to [`Error::RegistrationNotPersisted`]. A failure to update
    /// the cache after a successful durable write is logged and counted but not returned.
    pub async fn save(&self, registration: &SignedValidatorRegistrationV1) -> Result<()> {
        let pubkey = registration.message.pubkey;
        let timestamp = registration.message.timestamp;

        if let Err(error) = self
            .durable_store
            .save_validator_registration(registration)
            .await
        {
            self.register_outcome("failed");

            return Err(error).context(Error::RegistrationNotPersisted { pubkey, timestamp });
        }

        if let Err(error) = self
            .cache
            .set_validator_registration_timestamp_if_newer(pubkey, timestamp)
            .await
        {
            self.register_outcome("cache_failed");

            error_with_head!(
                "validator registration saved but cache update failed \
                 (pubkey: {pubkey:?}, timestamp: {timestamp}, cache: {}): {error:?}",
                self.cache.name(),
            );

            return Ok(());
        }

        self.register_outcome("saved");

        debug_with_head!(
            "validator registration saved (pubkey: {pubkey:?}, timestamp: {timestamp})",
        );

        Ok(())
    }

    pub async fn num_registered_validators(&self) -> Result<u64> {
        self.durable_store.num_registered_validators().await
    }

    fn register_outcome(&self, outcome: &str) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.register_registration_save(outcome);
        }
    }
}
