use core::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};
use std::{collections::HashMap, sync::Arc, time::Instant};

use arc_swap::{ArcSwap, Guard};
use logging::{
    debug_with_head, error_with_head, info_with_head, trace_with_head, HEAD_LOG_METRICS,
};
use prometheus_metrics::Metrics;
use types::phase0::{
    consts::GENESIS_SLOT,
    primitives::{PublicKeyBytes, Slot, ValidatorIndex},
};

use crate::{
    chain_state::{ChainStateSource, StateValidator},
    config::Config,
    misc,
    storage::{RelayCache, STATS_FIELD_VALIDATORS_TOTAL},
};

/// The validator set at the slot it was loaded in.
///
/// Both maps are always exact inverses of each other.
/// Snapshots are never modified after construction.
#[derive(Default, Debug)]
pub struct Snapshot {
    slot: Slot,
    indices_by_pubkey: HashMap<PublicKeyBytes, ValidatorIndex>,
    pubkeys_by_index: HashMap<ValidatorIndex, PublicKeyBytes>,
}

impl Snapshot {
    #[must_use]
    pub fn new(slot: Slot, validators: impl IntoIterator<Item = StateValidator>) -> Self {
        let validators = validators.into_iter();
        let (capacity, _) = validators.size_hint();

        let mut indices_by_pubkey = HashMap::with_capacity(capacity);
        let mut pubkeys_by_index = HashMap::with_capacity(capacity);

        // A well-behaved beacon node never returns duplicates.
        // If it does, the last entry wins and the entry it replaces is dropped from both maps.
        for StateValidator { index, pubkey } in validators {
            if let Some(old_pubkey) = pubkeys_by_index.insert(index, pubkey) {
                if old_pubkey != pubkey {
                    indices_by_pubkey.remove(&old_pubkey);
                }
            }

            if let Some(old_index) = indices_by_pubkey.insert(pubkey, index) {
                if old_index != index {
                    pubkeys_by_index.remove(&old_index);
                }
            }
        }

        Self {
            slot,
            indices_by_pubkey,
            pubkeys_by_index,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    #[must_use]
    pub fn contains(&self, pubkey: PublicKeyBytes) -> bool {
        self.indices_by_pubkey.contains_key(&pubkey)
    }

    #[must_use]
    pub fn index_of(&self, pubkey: PublicKeyBytes) -> Option<ValidatorIndex> {
        self.indices_by_pubkey.get(&pubkey).copied()
    }

    #[must_use]
    pub fn pubkey_at(&self, index: ValidatorIndex) -> Option<PublicKeyBytes> {
        self.pubkeys_by_index.get(&index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pubkeys_by_index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pubkeys_by_index.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefreshSkip {
    InFlight,
    NotNewer,
    TooSoon,
    NotScheduled,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefreshOutcome {
    Skipped(RefreshSkip),
    Failed,
    Updated { validators: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct RefreshPlan {
    forced: bool,
    delay: Option<Duration>,
}

fn plan_refresh(config: &Config, slot: Slot, last_slot: Slot) -> Result<RefreshPlan, RefreshSkip> {
    if slot <= last_slot {
        return Err(RefreshSkip::NotNewer);
    }

    let slots_since_last_update = slot - last_slot;

    if slots_since_last_update < config.min_slots_between_refreshes {
        return Err(RefreshSkip::TooSoon);
    }

    let forced = slots_since_last_update > config.force_refresh_after_slots;
    let scheduled = config
        .refresh_slot_positions
        .contains(&misc::slot_position_in_epoch(slot));

    if !forced && !scheduled {
        return Err(RefreshSkip::NotScheduled);
    }

    let delay = (last_slot != GENESIS_SLOT).then_some(config.refresh_delay);

    Ok(RefreshPlan { forced, delay })
}

// Clears the in-flight flag when dropped, including when the refresh future is cancelled.
struct UpdateGuard<'flag>(&'flag AtomicBool);

impl<'flag> UpdateGuard<'flag> {
    fn try_acquire(flag: &'flag AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::AcqRel)).then_some(Self(flag))
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// In-memory mirror of the validator set of the chain.
pub struct KnownValidators {
    config: Arc<Config>,
    source: Arc<dyn ChainStateSource>,
    stats: Arc<dyn RelayCache>,
    metrics: Option<Arc<Metrics>>,
    snapshot: ArcSwap<Snapshot>,
    is_updating: AtomicBool,
    last_slot: AtomicU64,
}

impl KnownValidators {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn ChainStateSource>,
        stats: Arc<dyn RelayCache>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            config,
            source,
            stats,
            metrics,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            is_updating: AtomicBool::new(false),
            last_slot: AtomicU64::new(GENESIS_SLOT),
        }
    }

    /// Reloads the validator set if `slot` is due for it.
    ///
    /// Meant to be called on every slot tick. The beacon node is queried at most once at a
    /// time, only at the configured positions in an epoch (or when the last update is too
    /// old), and `refresh_delay` into the slot. On failure the previous snapshot is kept
    /// and the next eligible slot tries again.
    pub async fn refresh(&self, slot: Slot) -> RefreshOutcome {
        let Some(_guard) = UpdateGuard::try_acquire(&self.is_updating) else {
            trace_with_head!("validator set refresh already in progress (slot: {slot})");
            return RefreshOutcome::Skipped(RefreshSkip::InFlight);
        };

        let last_slot = self.last_slot();

        let RefreshPlan { forced, delay } = match plan_refresh(&self.config, slot, last_slot) {
            Ok(plan) => plan,
            Err(reason) => {
                trace_with_head!(
                    "skipping validator set refresh (slot: {slot}, last slot: {last_slot}, \
                     reason: {reason:?})"
                );
                return RefreshOutcome::Skipped(reason);
            }
        };

        debug_with_head!(
            "refreshing validator set (slot: {slot}, slot position: {}, \
             last slot: {last_slot}, forced: {forced})",
            misc::slot_position_in_epoch(slot),
        );

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        info_with_head!("querying validators from chain state source (this may take a while)");

        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.validator_refresh_times.start_timer());

        let fetch_start = Instant::now();

        let validators = match self.source.state_validators(self.config.state_id).await {
            Ok(validators) => validators,
            Err(error) => {
                if let Some(timer) = timer {
                    timer.stop_and_discard();
                }

                if let Some(metrics) = self.metrics.as_ref() {
                    metrics.validator_refresh_failures.inc();
                }

                error_with_head!("failed to fetch validators (slot: {slot}): {error:?}");

                return RefreshOutcome::Failed;
            }
        };

        if let Some(timer) = timer {
            timer.observe_duration();
        }

        let snapshot = Snapshot::new(slot, validators);
        let validator_count = snapshot.len();

        info_with_head!(
            "received known validators (count: {validator_count}, fetch duration: {:?})",
            fetch_start.elapsed(),
        );

        self.snapshot.store(Arc::new(snapshot));
        self.last_slot.fetch_max(slot, Ordering::AcqRel);

        HEAD_LOG_METRICS.set_head_slot(slot);
        HEAD_LOG_METRICS.set_known_validators(validator_count);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.set_known_validators(validator_count, slot);
        }

        if let Err(error) = self
            .stats
            .set_stat(STATS_FIELD_VALIDATORS_TOTAL, &validator_count.to_string())
            .await
        {
            error_with_head!("failed to set {STATS_FIELD_VALIDATORS_TOTAL} stat: {error:?}");
        }

        info_with_head!("known validators updated (slot: {slot})");

        RefreshOutcome::Updated {
            validators: validator_count,
        }
    }

    /// Returns the current snapshot for a consistent view across several lookups.
    #[must_use]
    pub fn load(&self) -> Guard<Arc<Snapshot>> {
        self.snapshot.load()
    }

    #[must_use]
    pub fn is_known_validator(&self, pubkey: PublicKeyBytes) -> bool {
        self.load().contains(pubkey)
    }

    #[must_use]
    pub fn pubkey_by_index(&self, index: ValidatorIndex) -> Option<PublicKeyBytes> {
        self.load().pubkey_at(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    #[must_use]
    pub fn last_slot(&self) -> Slot {
        self.last_slot.load(Ordering::Acquire)
    }

    pub fn track_collection_metrics(&self, metrics: &Metrics) {
        metrics.set_collection_length("KnownValidators", "validators", self.len());
    }
}
