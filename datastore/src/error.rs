use thiserror::Error;
use types::{
    nonstandard::Phase,
    phase0::primitives::{PublicKeyBytes, UnixSeconds},
};

/// Outcomes that callers of the datastore need to tell apart.
///
/// These are returned inside [`anyhow::Error`] and can be recovered with
/// [`anyhow::Error::downcast_ref`]. Anything else is an infrastructure error.
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum Error {
    #[error("execution payload not found")]
    ExecutionPayloadNotFound,
    #[error("unsupported execution payload version: {phase}")]
    UnsupportedVersion { phase: Phase },
    #[error("unknown execution payload version: {version}")]
    UnknownVersion { version: String },
    #[error(
        "failed saving validator registration to durable store \
         (pubkey: {pubkey:?}, timestamp: {timestamp})"
    )]
    RegistrationNotPersisted {
        pubkey: PublicKeyBytes,
        timestamp: UnixSeconds,
    },
    #[error("failed to fetch validators from all {sources} chain state sources")]
    ChainStateSourcesFailed { sources: usize },
}
