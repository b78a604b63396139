use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::{collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use types::{
    combined::ExecutionPayload,
    phase0::primitives::{ExecutionAddress, PublicKeyBytes, SignatureBytes, Slot, UnixSeconds},
    unphased::containers::{SignedValidatorRegistrationV1, ValidatorRegistrationV1},
};

use crate::{
    keys::GetPayloadResponseKey,
    storage::{DurableStore, ExecutionPayloadEntry, PayloadCache, RelayCache},
};

pub fn registration(
    pubkey: PublicKeyBytes,
    timestamp: UnixSeconds,
) -> SignedValidatorRegistrationV1 {
    SignedValidatorRegistrationV1 {
        message: ValidatorRegistrationV1 {
            fee_recipient: ExecutionAddress::repeat_byte(0xfe),
            gas_limit: 30_000_000,
            timestamp,
            pubkey,
        },
        signature: SignatureBytes::zero(),
    }
}

pub fn entry(version: &str, payload: &ExecutionPayload) -> Result<ExecutionPayloadEntry> {
    let payload = match payload {
        ExecutionPayload::Bellatrix(payload) => serde_json::to_string(payload)?,
        ExecutionPayload::Capella(payload) => serde_json::to_string(payload)?,
    };

    Ok(ExecutionPayloadEntry {
        version: version.to_owned(),
        payload,
    })
}

/// Durable store backed by a `HashMap` that can be switched into failing.
#[derive(Default)]
pub struct MockDurableStore {
    pub registrations: Mutex<HashMap<PublicKeyBytes, SignedValidatorRegistrationV1>>,
    pub payloads: Mutex<HashMap<GetPayloadResponseKey, ExecutionPayloadEntry>>,
    pub fail: AtomicBool,
    pub payload_reads: AtomicUsize,
}

impl MockDurableStore {
    pub fn insert_payload(&self, key: GetPayloadResponseKey, entry: ExecutionPayloadEntry) {
        self.payloads
            .lock()
            .expect("mock durable store mutex is poisoned")
            .insert(key, entry);
    }

    pub fn payload_reads(&self) -> usize {
        self.payload_reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }

        Ok(())
    }
}

#[async_trait]
impl DurableStore for MockDurableStore {
    async fn save_validator_registration(
        &self,
        registration: &SignedValidatorRegistrationV1,
    ) -> Result<()> {
        self.check()?;

        self.registrations
            .lock()
            .expect("mock durable store mutex is poisoned")
            .insert(registration.message.pubkey, *registration);

        Ok(())
    }

    async fn execution_payload_entry(
        &self,
        key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayloadEntry>> {
        self.payload_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        Ok(self
            .payloads
            .lock()
            .expect("mock durable store mutex is poisoned")
            .get(key)
            .cloned())
    }

    async fn num_registered_validators(&self) -> Result<u64> {
        self.check()?;

        let registrations = self
            .registrations
            .lock()
            .expect("mock durable store mutex is poisoned");

        Ok(registrations.len().try_into()?)
    }
}

/// Cache tier that fails every operation and counts how often it was asked.
pub struct FailingCache {
    pub name: &'static str,
    pub calls: AtomicUsize,
}

impl FailingCache {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{} unavailable", self.name))
    }
}

#[async_trait]
impl PayloadCache for FailingCache {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execution_payload(
        &self,
        _key: &GetPayloadResponseKey,
    ) -> Result<Option<ExecutionPayload>> {
        self.fail()
    }

    async fn prune_execution_payloads_before(&self, _slot: Slot) -> Result<usize> {
        self.fail()
    }
}

#[async_trait]
impl RelayCache for FailingCache {
    async fn set_validator_registration_timestamp_if_newer(
        &self,
        _pubkey: PublicKeyBytes,
        _timestamp: UnixSeconds,
    ) -> Result<()> {
        self.fail()
    }

    async fn set_stat(&self, _field: &str, _value: &str) -> Result<()> {
        self.fail()
    }
}
