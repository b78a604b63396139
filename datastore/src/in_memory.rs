use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use prometheus_metrics::Metrics;
use types::{
    combined::ExecutionPayload,
    phase0::primitives::{PublicKeyBytes, Slot, UnixSeconds},
};

use crate::{
    keys::GetPayloadResponseKey,
    storage::{PayloadCache, RelayCache},
};

/// Process-local cache tier.
///
/// Used as the fast cache when a relay runs as a single instance and in tests.
/// Payloads are write-once: a second payload under the same key is ignored.
/// They are kept until pruned by slot. Registration timestamps are one per validator.
#[derive(Default)]
pub struct InMemoryCache {
    name: &'static str,
    payloads: DashMap<GetPayloadResponseKey, ExecutionPayload>,
    registration_timestamps: DashMap<PublicKeyBytes, UnixSeconds>,
    stats: DashMap<String, String>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Returns `true` if the payload was stored.
    pub fn save_execution_payload(
        &self,
        key: GetPayloadResponseKey,
        payload: ExecutionPayload,
    ) -> bool {
        let mut stored = false;

        self.payloads.entry(key).or_insert_with(|| {
            stored = true;
            payload
        });

        stored
    }

    #[must_use]
    pub fn validator_registration_timestamp(&self, pubkey: PublicKeyBytes) -> Option<UnixSeconds> {
        self.registration_timestamps
            .get(&pubkey)
            .map(|timestamp| *timestamp)
    }

    #[must_use]
    pub fn stat(&self, field: &str) -> Option<String> {
        self.stats.get(field).map(|value| value.clone())
    }

    pub fn track_collection_metrics(&self, metrics: &Metrics) {
        let type_name = self.name;

        metrics.set_collection_length(type_name, "payloads", self.payloads.len());

        metrics.set_collection_length(
            type_name,
            "registration_timestamps",
            self.registration_timestamps.len(),
        );
    }
}

#[async_trait]
impl PayloadCache for InMemoryCache {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execution_payload(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayload>> {
        Ok(self.payloads.get(key).map(|payload| payload.clone()))
    }

    async fn prune_execution_payloads_before(&self, slot: Slot) -> Result<usize> {
        let mut pruned = 0;

        self.payloads.retain(|key, _| {
            let keep = key.slot >= slot;
            pruned += usize::from(!keep);
            keep
        });

        Ok(pruned)
    }
}

#[async_trait]
impl RelayCache for InMemoryCache {
    async fn set_validator_registration_timestamp_if_newer(
        &self,
        pubkey: PublicKeyBytes,
        timestamp: UnixSeconds,
    ) -> Result<()> {
        // The shard lock held by `entry` makes the comparison and the write atomic.
        self.registration_timestamps
            .entry(pubkey)
            .and_modify(|stored| *stored = (*stored).max(timestamp))
            .or_insert(timestamp);

        Ok(())
    }

    async fn set_stat(&self, field: &str, value: &str) -> Result<()> {
        self.stats.insert(field.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future;
    use std_ext::ArcExt as _;
    use types::{
        bellatrix::containers::ExecutionPayload as BellatrixExecutionPayload,
        phase0::primitives::H256,
    };

    use super::*;

    fn payload(block_number: u64) -> ExecutionPayload {
        BellatrixExecutionPayload {
            block_number,
            ..BellatrixExecutionPayload::default()
        }
        .into()
    }

    #[tokio::test]
    async fn payloads_are_write_once() -> Result<()> {
        let cache = InMemoryCache::new("memory");
        let key =
            GetPayloadResponseKey::new(1, PublicKeyBytes::repeat_byte(1), H256::repeat_byte(2));

        assert_eq!(cache.execution_payload(&key).await?, None);
        assert!(cache.save_execution_payload(key, payload(10)));
        assert!(!cache.save_execution_payload(key, payload(11)));
        assert_eq!(cache.execution_payload(&key).await?, Some(payload(10)));

        Ok(())
    }

    #[tokio::test]
    async fn registration_timestamp_only_moves_forward() -> Result<()> {
        let cache = InMemoryCache::new("memory");
        let pubkey = PublicKeyBytes::repeat_byte(3);

        cache.set_validator_registration_timestamp_if_newer(pubkey, 200).await?;
        cache.set_validator_registration_timestamp_if_newer(pubkey, 100).await?;
        cache.set_validator_registration_timestamp_if_newer(pubkey, 200).await?;

        assert_eq!(cache.validator_registration_timestamp(pubkey), Some(200));

        cache.set_validator_registration_timestamp_if_newer(pubkey, 300).await?;

        assert_eq!(cache.validator_registration_timestamp(pubkey), Some(300));
        assert_eq!(
            cache.validator_registration_timestamp(PublicKeyBytes::zero()),
            None,
        );

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_timestamp_updates_keep_the_maximum() -> Result<()> {
        let cache = Arc::new(InMemoryCache::new("memory"));
        let pubkey = PublicKeyBytes::repeat_byte(4);

        let tasks = (1..=100).rev().map(|timestamp| {
            let cache = cache.clone_arc();
            tokio::spawn(async move {
                cache
                    .set_validator_registration_timestamp_if_newer(pubkey, timestamp)
                    .await
            })
        });

        for result in future::join_all(tasks).await {
            result??;
        }

        assert_eq!(cache.validator_registration_timestamp(pubkey), Some(100));

        Ok(())
    }

    #[tokio::test]
    async fn pruning_drops_payloads_of_earlier_slots() -> Result<()> {
        let cache = InMemoryCache::new("memory");
        let key = |slot| {
            GetPayloadResponseKey::new(slot, PublicKeyBytes::repeat_byte(5), H256::repeat_byte(6))
        };

        for slot in 10..20 {
            assert!(cache.save_execution_payload(key(slot), payload(slot)));
        }

        assert_eq!(cache.prune_execution_payloads_before(15).await?, 5);
        assert_eq!(cache.prune_execution_payloads_before(15).await?, 0);

        assert_eq!(cache.execution_payload(&key(14)).await?, None);
        assert_eq!(cache.execution_payload(&key(15)).await?, Some(payload(15)));
        assert_eq!(cache.execution_payload(&key(19)).await?, Some(payload(19)));

        // A pruned key can be filled again.
        assert!(cache.save_execution_payload(key(10), payload(10)));

        Ok(())
    }

    #[tokio::test]
    async fn collection_lengths_are_exported() -> Result<()> {
        let cache = InMemoryCache::new("memory");
        let metrics = Metrics::new()?;
        let pubkey = PublicKeyBytes::repeat_byte(7);

        cache.save_execution_payload(
            GetPayloadResponseKey::new(1, pubkey, H256::repeat_byte(8)),
            payload(1),
        );

        cache.set_validator_registration_timestamp_if_newer(pubkey, 100).await?;
        cache.set_validator_registration_timestamp_if_newer(PublicKeyBytes::zero(), 100).await?;
        cache.track_collection_metrics(&metrics);

        assert_eq!(metrics.collection_length("memory", "payloads"), 1);
        assert_eq!(metrics.collection_length("memory", "registration_timestamps"), 2);

        Ok(())
    }

    #[tokio::test]
    async fn stats_are_overwritten() -> Result<()> {
        let cache = InMemoryCache::new("memory");

        cache.set_stat("validators-total", "1").await?;
        cache.set_stat("validators-total", "2").await?;

        assert_eq!(cache.stat("validators-total").as_deref(), Some("2"));
        assert_eq!(cache.stat("missing"), None);

        Ok(())
    }
}
