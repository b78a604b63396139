use derive_more::{AsRef, Deref, From, Into};
use serde::{Deserialize, Serialize};

/// Variable-length bytes serialized as `0x`-prefixed hexadecimal.
///
/// Used for `extra_data` and transactions. Length limits are enforced by builders and
/// execution clients before anything reaches the relay datastore.
#[derive(
    Clone, PartialEq, Eq, Hash, Default, Debug, AsRef, Deref, From, Into, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct ByteList(#[serde(with = "impl_serde::serialize")] Vec<u8>);

impl From<&[u8]> for ByteList {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}
