//! Independently versioned containers from [`builder-specs`].
//!
//! [`builder-specs`]: https://github.com/ethereum/builder-specs/blob/d246d57ba2a0c2378c1de4a2bdaff7cd438e99ee/specs/builder.md#independently-versioned

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{
    bellatrix::primitives::Gas,
    phase0::primitives::{ExecutionAddress, PublicKeyBytes, SignatureBytes, UnixSeconds},
};

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct ValidatorRegistrationV1 {
    pub fee_recipient: ExecutionAddress,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: Gas,
    #[serde_as(as = "DisplayFromStr")]
    pub timestamp: UnixSeconds,
    pub pubkey: PublicKeyBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct SignedValidatorRegistrationV1 {
    pub message: ValidatorRegistrationV1,
    pub signature: SignatureBytes,
}
