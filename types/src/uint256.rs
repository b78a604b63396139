use core::{
    fmt::{Formatter, Result as FmtResult},
    str::FromStr,
};

use derive_more::{Add, Debug, Display, From, Into, LowerHex, Sub};
use ethereum_types::{FromDecStrErr, U256 as RawUint256};
use serde::{
    de::{Error, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// A 256-bit unsigned integer that uses the decimal string representation of `builder-specs`.
///
/// [`ethereum_types::U256`] serializes as a hexadecimal quantity, which is what execution
/// clients use but not what builders and relays send.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    From,
    Into,
    Add,
    Sub,
    Debug,
    Display,
    LowerHex,
)]
#[debug("{_0}")]
pub struct Uint256(RawUint256);

impl FromStr for Uint256 {
    type Err = FromDecStrErr;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        RawUint256::from_dec_str(string).map(Self)
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Uint256Visitor;

        impl Visitor<'_> for Uint256Visitor {
            type Value = Uint256;

            fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
                formatter.write_str("a 256-bit unsigned integer in decimal")
            }

            fn visit_str<E: Error>(self, string: &str) -> Result<Self::Value, E> {
                string.parse().map_err(|error| E::custom(format!("{error:?}")))
            }

            fn visit_u64<E: Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(value.into())
            }
        }

        deserializer.deserialize_any(Uint256Visitor)
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
