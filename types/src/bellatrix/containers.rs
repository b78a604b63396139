//! Bellatrix execution payload from [`consensus-specs`].
//!
//! This is the legacy payload shape. The relay still serves it for slots before Capella.
//!
//! [`consensus-specs`]: https://github.com/ethereum/consensus-specs/blob/9839ed49346a85f95af4f8b0cb9c4d98b2308af8/specs/bellatrix/beacon-chain.md#executionpayload

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{
    bellatrix::primitives::{ByteList, Gas, Transaction, Wei},
    phase0::primitives::{
        Bloom, ExecutionAddress, ExecutionBlockHash, ExecutionBlockNumber, UnixSeconds, H256,
    },
};

#[serde_as]
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionPayload {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub prev_randao: H256,
    #[serde_as(as = "DisplayFromStr")]
    pub block_number: ExecutionBlockNumber,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: Gas,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_used: Gas,
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: UnixSeconds,
    pub extra_data: Arc<ByteList>,
    pub base_fee_per_gas: Wei,
    pub block_hash: ExecutionBlockHash,
    pub transactions: Arc<Vec<Transaction>>,
}
