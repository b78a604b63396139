use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use derive_more::Display;

pub static HEAD_LOG_METRICS: HeadLogMetrics = HeadLogMetrics::new();

/// Relay context prepended to every log line emitted through the macros in this crate.
///
/// `head` is the slot of the last successful validator set refresh,
/// not necessarily the current head of the chain.
#[derive(Display, Debug)]
#[display("head: {head_slot:?}, validators: {known_validators:?}")]
pub struct HeadLogMetrics {
    head_slot: AtomicU64,
    known_validators: AtomicUsize,
}

impl HeadLogMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head_slot: AtomicU64::new(0),
            known_validators: AtomicUsize::new(0),
        }
    }

    pub fn set_head_slot(&self, head_slot: u64) {
        self.head_slot.fetch_max(head_slot, Ordering::Relaxed);
    }

    pub fn set_known_validators(&self, known_validators: usize) {
        self.known_validators
            .store(known_validators, Ordering::Relaxed)
    }

    #[must_use]
    pub fn head_slot(&self) -> u64 {
        self.head_slot.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn known_validators(&self) -> usize {
        self.known_validators.load(Ordering::Relaxed)
    }
}

impl Default for HeadLogMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! info_with_head {
    ($($arg:tt)*) => {
        ::tracing::info!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! debug_with_head {
    ($($arg:tt)*) => {
        ::tracing::debug!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_with_head {
    ($($arg:tt)*) => {
        ::tracing::warn!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_with_head {
    ($($arg:tt)*) => {
        ::tracing::error!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_with_head {
    ($($arg:tt)*) => {
        ::tracing::trace!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}
