use core::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, DurationSeconds};

use crate::chain_state::StateId;

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(6);
pub const DEFAULT_MIN_SLOTS_BETWEEN_REFRESHES: u64 = 6;
pub const DEFAULT_FORCE_REFRESH_AFTER_SLOTS: u64 = 32;
// Loading the validator set is expensive for the beacon node,
// so it is only done at these 1-based positions in an epoch.
pub const DEFAULT_REFRESH_SLOT_POSITIONS: [u64; 2] = [4, 20];
pub const DEFAULT_PAYLOAD_RETENTION_SLOTS: u64 = 64;

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How long to wait into the slot before querying the chain state source.
    /// Not applied to the very first refresh.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub refresh_delay: Duration,
    pub min_slots_between_refreshes: u64,
    pub force_refresh_after_slots: u64,
    pub refresh_slot_positions: Vec<u64>,
    #[serde_as(as = "DisplayFromStr")]
    pub state_id: StateId,
    /// Cached payloads older than this many slots are dropped on refresh ticks.
    pub payload_retention_slots: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_delay: DEFAULT_REFRESH_DELAY,
            min_slots_between_refreshes: DEFAULT_MIN_SLOTS_BETWEEN_REFRESHES,
            force_refresh_after_slots: DEFAULT_FORCE_REFRESH_AFTER_SLOTS,
            refresh_slot_positions: DEFAULT_REFRESH_SLOT_POSITIONS.to_vec(),
            state_id: StateId::default(),
            payload_retention_slots: DEFAULT_PAYLOAD_RETENTION_SLOTS,
        }
    }
}
