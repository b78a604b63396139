use types::phase0::{consts::SLOTS_PER_EPOCH, primitives::Slot};

#[must_use]
pub const fn slots_since_epoch_start(slot: Slot) -> u64 {
    slot % SLOTS_PER_EPOCH
}

/// 1-based position of `slot` in its epoch, ranging from 1 to `SLOTS_PER_EPOCH`.
#[must_use]
pub const fn slot_position_in_epoch(slot: Slot) -> u64 {
    slots_since_epoch_start(slot) + 1
}
