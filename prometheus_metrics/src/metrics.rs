use anyhow::Result;
use prometheus::{
    histogram_opts, opts, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};
use tracing::warn;

#[derive(Debug)]
pub struct Metrics {
    // Collection Lengths
    collection_lengths: IntGaugeVec,

    // Known validators
    known_validators: IntGauge,
    known_validators_last_slot: IntGauge,
    pub validator_refresh_times: Histogram,
    pub validator_refresh_failures: IntCounter,

    // Payload lookups
    payload_lookups: IntCounterVec,

    // Validator registrations
    registration_saves: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Collection Lengths
            collection_lengths: IntGaugeVec::new(
                opts!(
                    "RELAY_COLLECTION_LENGTHS",
                    "Number of items in each tracked collection"
                ),
                &["type", "collection"],
            )?,

            // Known validators
            known_validators: IntGauge::new(
                "RELAY_KNOWN_VALIDATORS",
                "Number of validators in the current validator set snapshot",
            )?,

            known_validators_last_slot: IntGauge::new(
                "RELAY_KNOWN_VALIDATORS_LAST_SLOT",
                "Slot of the last successful validator set refresh",
            )?,

            validator_refresh_times: Histogram::with_opts(histogram_opts!(
                "RELAY_VALIDATOR_REFRESH_TIMES",
                "Time spent fetching the validator set from the beacon node",
                vec![0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0],
            ))?,

            validator_refresh_failures: IntCounter::new(
                "RELAY_VALIDATOR_REFRESH_FAILURES",
                "Number of failed validator set refreshes",
            )?,

            // Payload lookups
            payload_lookups: IntCounterVec::new(
                opts!(
                    "RELAY_PAYLOAD_LOOKUPS",
                    "Number of execution payload lookups by storage tier and outcome"
                ),
                &["tier", "outcome"],
            )?,

            // Validator registrations
            registration_saves: IntCounterVec::new(
                opts!(
                    "RELAY_REGISTRATION_SAVES",
                    "Number of validator registration writes by outcome"
                ),
                &["outcome"],
            )?,
        })
    }

    pub fn register_with_default_metrics(&self) -> Result<()> {
        let default_registry = prometheus::default_registry();

        default_registry.register(Box::new(self.collection_lengths.clone()))?;
        default_registry.register(Box::new(self.known_validators.clone()))?;
        default_registry.register(Box::new(self.known_validators_last_slot.clone()))?;
        default_registry.register(Box::new(self.validator_refresh_times.clone()))?;
        default_registry.register(Box::new(self.validator_refresh_failures.clone()))?;
        default_registry.register(Box::new(self.payload_lookups.clone()))?;
        default_registry.register(Box::new(self.registration_saves.clone()))?;

        Ok(())
    }

    // Collection Lengths
    pub fn set_collection_length(&self, typename: &str, collection_name: &str, value: usize) {
        match self
            .collection_lengths
            .get_metric_with_label_values(&[typename, collection_name])
        {
            Ok(gauge) => gauge.set(saturating_i64(value)),
            Err(error) => {
                warn!("unable to set length of {typename}::{collection_name}: {error:?}")
            }
        }
    }

    #[must_use]
    pub fn collection_length(&self, typename: &str, collection_name: &str) -> i64 {
        self.collection_lengths
            .get_metric_with_label_values(&[typename, collection_name])
            .map(|gauge| gauge.get())
            .unwrap_or_default()
    }

    // Known validators
    pub fn set_known_validators(&self, validator_count: usize, slot: u64) {
        self.known_validators.set(saturating_i64(validator_count));
        self.known_validators_last_slot
            .set(i64::try_from(slot).unwrap_or(i64::MAX));
    }

    #[must_use]
    pub fn known_validators(&self) -> i64 {
        self.known_validators.get()
    }

    // Payload lookups
    pub fn register_payload_lookup(&self, tier: &str, outcome: &str) {
        match self
            .payload_lookups
            .get_metric_with_label_values(&[tier, outcome])
        {
            Ok(counter) => counter.inc(),
            Err(error) => {
                warn!("unable to register payload lookup ({tier}, {outcome}): {error:?}")
            }
        }
    }

    #[must_use]
    pub fn payload_lookups(&self, tier: &str, outcome: &str) -> u64 {
        self.payload_lookups
            .get_metric_with_label_values(&[tier, outcome])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }

    // Validator registrations
    pub fn register_registration_save(&self, outcome: &str) {
        match self
            .registration_saves
            .get_metric_with_label_values(&[outcome])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to register validator registration save: {error:?}"),
        }
    }

    #[must_use]
    pub fn registration_saves(&self, outcome: &str) -> u64 {
        self.registration_saves
            .get_metric_with_label_values(&[outcome])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_lookups_are_counted_per_tier_and_outcome() -> Result<()> {
        let metrics = Metrics::new()?;

        metrics.register_payload_lookup("redis", "miss");
        metrics.register_payload_lookup("redis", "miss");
        metrics.register_payload_lookup("database", "hit");

        assert_eq!(metrics.payload_lookups("redis", "miss"), 2);
        assert_eq!(metrics.payload_lookups("database", "hit"), 1);
        assert_eq!(metrics.payload_lookups("memcached", "hit"), 0);

        Ok(())
    }

    #[test]
    fn known_validators_gauge_tracks_last_refresh() -> Result<()> {
        let metrics = Metrics::new()?;

        metrics.set_known_validators(21_063, 4);

        assert_eq!(metrics.known_validators(), 21_063);

        Ok(())
    }
}
