use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use logging::{debug_with_head, error_with_head, warn_with_head};
use prometheus_metrics::Metrics;
use types::{
    bellatrix::containers::ExecutionPayload as BellatrixExecutionPayload,
    capella::containers::ExecutionPayload as CapellaExecutionPayload,
    combined::ExecutionPayload,
    nonstandard::Phase,
    phase0::primitives::Slot,
};

use crate::{
    error::Error,
    keys::GetPayloadResponseKey,
    storage::{DurableStore, ExecutionPayloadEntry, PayloadCache},
};

const DURABLE_STORE_TIER: &str = "database";

/// Resolves execution payloads from the fastest tier that has them.
///
/// Caches are queried in order and the durable store last. A cache error is treated as a
/// miss. Nothing found in any tier is [`Error::ExecutionPayloadNotFound`]. Durable store
/// errors are returned as they are and never reported as not found.
///
/// Payloads are immutable once stored. A hit in an earlier tier is final.
pub struct PayloadLookup {
    caches: Vec<Arc<dyn PayloadCache>>,
    durable_store: Arc<dyn DurableStore>,
    metrics: Option<Arc<Metrics>>,
}

impl PayloadLookup {
    #[must_use]
    pub fn new(
        caches: Vec<Arc<dyn PayloadCache>>,
        durable_store: Arc<dyn DurableStore>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            caches,
            durable_store,
            metrics,
        }
    }

    pub async fn execution_payload(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<ExecutionPayload> {
        for cache in &self.caches {
            let tier = cache.name();

            match cache.execution_payload(key).await {
                Ok(Some(payload)) => {
                    self.register_lookup(tier, "hit");
                    return Ok(payload);
                }
                Ok(None) => {
                    self.register_lookup(tier, "miss");
                    debug_with_head!(
                        "execution payload not in {tier} (key: {})",
                        key.cache_key(),
                    );
                }
                Err(error) => {
                    self.register_lookup(tier, "error");
                    warn_with_head!(
                        "failed to read execution payload from {tier} (key: {}): {error:?}",
                        key.cache_key(),
                    );
                }
            }
        }

        let entry = match self.durable_store.execution_payload_entry(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.register_lookup(DURABLE_STORE_TIER, "miss");
                warn_with_head!("execution payload not found (key: {})", key.cache_key());
                bail!(Error::ExecutionPayloadNotFound);
            }
            Err(error) => {
                self.register_lookup(DURABLE_STORE_TIER, "error");
                error_with_head!(
                    "failed to read execution payload from durable store (key: {}): {error:?}",
                    key.cache_key(),
                );
                return Err(error);
            }
        };

        self.register_lookup(DURABLE_STORE_TIER, "hit");

        warn_with_head!(
            "serving execution payload from durable store (key: {}, version: {})",
            key.cache_key(),
            entry.version,
        );

        decode_execution_payload(&entry)
    }

    /// Drops cached payloads of slots before `slot` from every cache tier.
    ///
    /// The durable store is never pruned. Failures are logged and the remaining tiers are
    /// still pruned.
    pub async fn prune_before(&self, slot: Slot) {
        for cache in &self.caches {
            let tier = cache.name();

            match cache.prune_execution_payloads_before(slot).await {
                Ok(0) => {}
                Ok(pruned) => {
                    debug_with_head!(
                        "pruned {pruned} execution payloads from {tier} (before slot: {slot})",
                    );
                }
                Err(error) => {
                    warn_with_head!(
                        "failed to prune execution payloads from {tier} \
                         (before slot: {slot}): {error:?}",
                    );
                }
            }
        }
    }

    fn register_lookup(&self, tier: &str, outcome: &str) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.register_payload_lookup(tier, outcome);
        }
    }
}

/// Decodes a raw durable store row according to its version tag.
///
/// The version is itself JSON (`"capella"` with quotes). Phases that never had execution
/// payloads, and phases this relay cannot serve yet, are [`Error::UnsupportedVersion`].
/// Anything that is not a known phase name is [`Error::UnknownVersion`].
pub fn decode_execution_payload(entry: &ExecutionPayloadEntry) -> Result<ExecutionPayload> {
    let ExecutionPayloadEntry { version, payload } = entry;

    let Ok(phase) = serde_json::from_str::<Phase>(version) else {
        bail!(Error::UnknownVersion {
            version: version.clone(),
        });
    };

    let payload = match phase {
        Phase::Bellatrix => serde_json::from_str::<BellatrixExecutionPayload>(payload)
            .context("failed to decode Bellatrix execution payload")?
            .into(),
        Phase::Capella => serde_json::from_str::<CapellaExecutionPayload>(payload)
            .context("failed to decode Capella execution payload")?
            .into(),
        Phase::Phase0 | Phase::Altair | Phase::Deneb => {
            bail!(Error::UnsupportedVersion { phase })
        }
    };

    Ok(payload)
}
