use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    bellatrix::containers::ExecutionPayload as BellatrixExecutionPayload,
    capella::containers::ExecutionPayload as CapellaExecutionPayload,
    nonstandard::Phase,
    phase0::primitives::{ExecutionBlockHash, ExecutionBlockNumber},
};

/// An execution payload of any phase the relay can serve.
///
/// Serialized the same way as `getPayload` responses in `builder-specs`.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "version", content = "data")]
pub enum ExecutionPayload {
    Bellatrix(Arc<BellatrixExecutionPayload>),
    Capella(Arc<CapellaExecutionPayload>),
}

impl From<BellatrixExecutionPayload> for ExecutionPayload {
    fn from(payload: BellatrixExecutionPayload) -> Self {
        Self::Bellatrix(Arc::new(payload))
    }
}

impl From<CapellaExecutionPayload> for ExecutionPayload {
    fn from(payload: CapellaExecutionPayload) -> Self {
        Self::Capella(Arc::new(payload))
    }
}

impl ExecutionPayload {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
        }
    }

    #[must_use]
    pub fn block_hash(&self) -> ExecutionBlockHash {
        match self {
            Self::Bellatrix(payload) => payload.block_hash,
            Self::Capella(payload) => payload.block_hash,
        }
    }

    #[must_use]
    pub fn block_number(&self) -> ExecutionBlockNumber {
        match self {
            Self::Bellatrix(payload) => payload.block_number,
            Self::Capella(payload) => payload.block_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    use crate::phase0::primitives::H256;

    use super::*;

    fn capella_payload_json() -> serde_json::Value {
        json!({
            "parent_hash": "0xcf8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2",
            "fee_recipient": "0xabcf8e0d4e9587369b2301d0790347320302cc09",
            "state_root": "0xcf8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2",
            "receipts_root": "0xcf8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2",
            "logs_bloom": format!("0x{}", "00".repeat(256)),
            "prev_randao": "0xcf8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2",
            "block_number": "1",
            "gas_limit": "30000000",
            "gas_used": "21000",
            "timestamp": "1681338455",
            "extra_data": "0x",
            "base_fee_per_gas": "7",
            "block_hash": "0x1f8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2",
            "transactions": ["0x02f878831469668303f51d843b9ac9f9843b9aca0082520894c93269b73096998db66be0441e836d873535cb9c8894a19041886f000080c001a031cc29234036afbf9a1fb9476b463367cb1f957ac0b919b69bbc798436e604aaa018c4e9c3914eb27aadd0b91e10b18655739fcf8c1fc398763a9f1beecb8ddc86"],
            "withdrawals": [{
                "index": "1",
                "validator_index": "1",
                "address": "0xabcf8e0d4e9587369b2301d0790347320302cc09",
                "amount": "32000000000",
            }],
        })
    }

    #[test]
    fn versioned_payload_uses_builder_specs_envelope() -> Result<()> {
        let json = json!({ "version": "capella", "data": capella_payload_json() });
        let payload = serde_json::from_value::<ExecutionPayload>(json.clone())?;

        assert_eq!(payload.phase(), Phase::Capella);
        assert_eq!(payload.block_number(), 1);
        assert_eq!(
            payload.block_hash(),
            "1f8e0d4e9587369b2301d0790347320302cc0943d5a1884560367e8208d920f2".parse::<H256>()?,
        );
        assert_eq!(serde_json::to_value(&payload)?, json);

        Ok(())
    }

    #[test]
    fn bellatrix_payload_rejects_withdrawals() {
        let json = json!({ "version": "bellatrix", "data": capella_payload_json() });

        assert!(serde_json::from_value::<ExecutionPayload>(json).is_err());
    }
}
