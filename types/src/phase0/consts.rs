use crate::phase0::primitives::Slot;

pub const GENESIS_SLOT: Slot = 0;

/// `SLOTS_PER_EPOCH` from the mainnet preset. The relay does not support other presets.
pub const SLOTS_PER_EPOCH: u64 = 32;
