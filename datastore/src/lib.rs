//! Tiered storage behind the relay API.
//!
//! [`Datastore`] owns an in-memory mirror of the chain's validator set and coordinates reads
//! and writes across the fast cache tiers and the durable store. Concrete cache and database
//! clients are plugged in through the traits in [`storage`] and [`chain_state`].

pub use crate::{
    chain_state::{ChainStateSource, MultiChainStateSource, StateId, StateValidator},
    config::Config,
    datastore::Datastore,
    error::Error,
    in_memory::InMemoryCache,
    keys::{GetHeaderResponseKey, GetPayloadResponseKey},
    known_validators::{KnownValidators, RefreshOutcome, RefreshSkip, Snapshot},
    payloads::{decode_execution_payload, PayloadLookup},
    registrations::RegistrationCoordinator,
    storage::{
        DurableStore, ExecutionPayloadEntry, PayloadCache, RelayCache,
        STATS_FIELD_VALIDATORS_TOTAL,
    },
};

pub mod chain_state;
pub mod config;
pub mod storage;

mod datastore;
mod error;
mod in_memory;
mod keys;
mod known_validators;
mod misc;
mod payloads;
mod registrations;

#[cfg(test)]
mod mocks;
