use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Protocol versions known to the relay.
///
/// The set is closed. A version published after the relay was built is not representable and
/// fails to parse, which is distinct from a version that is known but cannot be served.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Deserialize,
    Serialize,
    Sequence,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("\"phase0\"" => Some(Phase::Phase0))]
    #[test_case("\"bellatrix\"" => Some(Phase::Bellatrix))]
    #[test_case("\"capella\"" => Some(Phase::Capella))]
    #[test_case("\"deneb\"" => Some(Phase::Deneb))]
    #[test_case("\"Capella\"" => None)]
    #[test_case("\"electra\"" => None)]
    #[test_case("capella" => None)]
    fn phase_from_json(json: &str) -> Option<Phase> {
        serde_json::from_str(json).ok()
    }

    #[test]
    fn phase_string_forms_agree() {
        for phase in enum_iterator::all::<Phase>() {
            assert_eq!(phase.to_string(), phase.as_ref());
            assert_eq!(phase.as_ref().parse::<Phase>().ok(), Some(phase));
        }
    }
}
