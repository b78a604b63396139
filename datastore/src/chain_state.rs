use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    num::ParseIntError,
    str::FromStr,
};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use logging::warn_with_head;
use types::phase0::primitives::{PublicKeyBytes, Slot, ValidatorIndex};

use crate::error::Error;

/// Identifies the beacon state to read validators from.
///
/// Uses the same string forms as the `state_id` path parameter of the Beacon Node API.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum StateId {
    /// Fastest to serve, so it is what the relay normally asks for.
    #[default]
    Head,
    Finalized,
    Justified,
    Genesis,
    Slot(Slot),
}

impl Display for StateId {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        match self {
            Self::Head => formatter.write_str("head"),
            Self::Finalized => formatter.write_str("finalized"),
            Self::Justified => formatter.write_str("justified"),
            Self::Genesis => formatter.write_str("genesis"),
            Self::Slot(slot) => write!(formatter, "{slot}"),
        }
    }
}

impl FromStr for StateId {
    type Err = ParseIntError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let state_id = match string {
            "head" => Self::Head,
            "finalized" => Self::Finalized,
            "justified" => Self::Justified,
            "genesis" => Self::Genesis,
            slot => Self::Slot(slot.parse()?),
        };

        Ok(state_id)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StateValidator {
    pub index: ValidatorIndex,
    pub pubkey: PublicKeyBytes,
}

/// Supplies the full validator set of a beacon state.
///
/// Implementations are expected to enforce their own timeouts.
/// A single call may take several seconds.
#[async_trait]
pub trait ChainStateSource: Send + Sync {
    async fn state_validators(&self, state_id: StateId) -> Result<Vec<StateValidator>>;
}

/// Tries several chain state sources (usually one per beacon node) in order.
pub struct MultiChainStateSource {
    sources: Vec<Arc<dyn ChainStateSource>>,
}

impl MultiChainStateSource {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn ChainStateSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ChainStateSource for MultiChainStateSource {
    async fn state_validators(&self, state_id: StateId) -> Result<Vec<StateValidator>> {
        for (position, source) in self.sources.iter().enumerate() {
            match source.state_validators(state_id).await {
                Ok(validators) => return Ok(validators),
                Err(error) => warn_with_head!(
                    "failed to fetch validators from chain state source {position} \
                     (state_id: {state_id}): {error:?}"
                ),
            }
        }

        bail!(Error::ChainStateSourcesFailed {
            sources: self.sources.len(),
        })
    }
}
