use anyhow::{Context as _, Result};
use hex::FromHex as _;
use types::phase0::primitives::{ExecutionBlockHash, PublicKeyBytes, Slot, H256};

/// Addresses a cached `getHeader` response.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GetHeaderResponseKey {
    pub slot: Slot,
    pub parent_hash: ExecutionBlockHash,
    pub proposer_pubkey: PublicKeyBytes,
}

impl GetHeaderResponseKey {
    #[must_use]
    pub fn cache_key(&self) -> String {
        let Self {
            slot,
            parent_hash,
            proposer_pubkey,
        } = self;

        format!("{slot}_{parent_hash:#x}_{proposer_pubkey:#x}")
    }
}

/// Addresses an execution payload in every storage tier.
///
/// Keeps all three fields instead of a digest because requests may arrive with any of them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GetPayloadResponseKey {
    pub slot: Slot,
    pub proposer_pubkey: PublicKeyBytes,
    pub block_hash: ExecutionBlockHash,
}

impl GetPayloadResponseKey {
    #[must_use]
    pub const fn new(
        slot: Slot,
        proposer_pubkey: PublicKeyBytes,
        block_hash: ExecutionBlockHash,
    ) -> Self {
        Self {
            slot,
            proposer_pubkey,
            block_hash,
        }
    }

    /// Parses a key from hexadecimal strings as received by the API layer.
    ///
    /// Digits may be in either case and the `0x` prefix is optional.
    pub fn parse(slot: Slot, proposer_pubkey: &str, block_hash: &str) -> Result<Self> {
        let proposer_pubkey = PublicKeyBytes::from_hex(strip_hex_prefix(proposer_pubkey))
            .with_context(|| format!("invalid proposer pubkey: {proposer_pubkey}"))?;

        let block_hash = <[u8; 32]>::from_hex(strip_hex_prefix(block_hash))
            .map(H256)
            .with_context(|| format!("invalid block hash: {block_hash}"))?;

        Ok(Self::new(slot, proposer_pubkey, block_hash))
    }

    /// Canonical lowercase form shared by every tier.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let Self {
            slot,
            proposer_pubkey,
            block_hash,
        } = self;

        format!("{slot}_{proposer_pubkey:#x}_{block_hash:#x}")
    }
}

fn strip_hex_prefix(string: &str) -> &str {
    string
        .strip_prefix("0x")
        .or_else(|| string.strip_prefix("0X"))
        .unwrap_or(string)
}
