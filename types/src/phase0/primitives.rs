use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;

pub use ethereum_types::{Bloom, H160, H256};

pub use crate::uint256::Uint256;

pub type ExecutionAddress = H160;
pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
pub type WithdrawalIndex = u64;

pub const PUBLIC_KEY_SIZE: usize = 48;
pub const SIGNATURE_SIZE: usize = 96;

construct_fixed_hash! {
    pub struct PublicKeyBytes(PUBLIC_KEY_SIZE);
}

construct_fixed_hash! {
    pub struct SignatureBytes(SIGNATURE_SIZE);
}

impl_fixed_hash_serde!(PublicKeyBytes, PUBLIC_KEY_SIZE);
impl_fixed_hash_serde!(SignatureBytes, SIGNATURE_SIZE);

impl hex::FromHex for PublicKeyBytes {
    type Error = <[u8; PUBLIC_KEY_SIZE] as hex::FromHex>::Error;

    fn from_hex<T: AsRef<[u8]>>(digits: T) -> Result<Self, Self::Error> {
        hex::FromHex::from_hex(digits).map(Self)
    }
}
