pub use crate::bytes::ByteList;

use crate::phase0::primitives::Uint256;

pub type Gas = u64;
pub type Transaction = ByteList;
pub type Wei = Uint256;
