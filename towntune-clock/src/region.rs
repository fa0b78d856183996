//! Coarse chat-server regions and their base UTC offsets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClockError;

/// Version of the region table below. Bump when an entry changes.
pub const REGION_TABLE_VERSION: u32 = 1;

/// A voice region reported by the chat platform for a group
///
/// Each region maps to a base (non-DST) UTC offset. The offsets are coarse:
/// several regions share one and none of them names a concrete timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    UsWest,
    UsEast,
    UsCentral,
    EuWest,
    EuEast,
    EuCentral,
    Singapore,
    London,
    Sydney,
    Amsterdam,
    Frankfurt,
    Brazil,
    VipUsEast,
    VipUsWest,
    VipAmsterdam,
}

impl Region {
    /// Every supported region, in table order
    pub const ALL: [Region; 15] = [
        Region::UsWest,
        Region::UsEast,
        Region::UsCentral,
        Region::EuWest,
        Region::EuEast,
        Region::EuCentral,
        Region::Singapore,
        Region::London,
        Region::Sydney,
        Region::Amsterdam,
        Region::Frankfurt,
        Region::Brazil,
        Region::VipUsEast,
        Region::VipUsWest,
        Region::VipAmsterdam,
    ];

    /// The platform's label for this region, e.g. `us-east`
    pub fn label(&self) -> &'static str {
        match self {
            Region::UsWest => "us-west",
            Region::UsEast => "us-east",
            Region::UsCentral => "us-central",
            Region::EuWest => "eu-west",
            Region::EuEast => "eu-east",
            Region::EuCentral => "eu-central",
            Region::Singapore => "singapore",
            Region::London => "london",
            Region::Sydney => "sydney",
            Region::Amsterdam => "amsterdam",
            Region::Frankfurt => "frankfurt",
            Region::Brazil => "brazil",
            Region::VipUsEast => "vip-us-east",
            Region::VipUsWest => "vip-us-west",
            Region::VipAmsterdam => "vip-amsterdam",
        }
    }

    /// Base UTC offset in hours, before any daylight-saving adjustment
    pub fn base_offset(&self) -> i32 {
        match self {
            Region::UsWest | Region::VipUsWest => -8,
            Region::UsCentral => -6,
            Region::UsEast | Region::VipUsEast => -5,
            Region::Brazil => -3,
            Region::EuWest => 0,
            Region::EuCentral | Region::London => 1,
            Region::EuEast | Region::Amsterdam | Region::Frankfurt | Region::VipAmsterdam => 2,
            Region::Singapore => 8,
            Region::Sydney => 10,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Region::ALL
            .iter()
            .copied()
            .find(|region| region.label() == wanted)
            .ok_or_else(|| ClockError::UnknownRegion(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = ClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("us-east", Region::UsEast)]
    #[case("US-EAST", Region::UsEast)]
    #[case("  sydney ", Region::Sydney)]
    #[case("vip-amsterdam", Region::VipAmsterdam)]
    fn test_parse(#[case] label: &str, #[case] expected: Region) {
        assert_eq!(label.parse::<Region>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "moon-base".parse::<Region>().unwrap_err();
        assert_eq!(err, ClockError::UnknownRegion("moon-base".to_string()));
    }

    #[test]
    fn test_labels_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for region in Region::ALL {
            assert!(seen.insert(region.label()));
            assert_eq!(region.label().parse::<Region>().unwrap(), region);
        }
        assert_eq!(seen.len(), Region::ALL.len());
    }

    #[rstest]
    #[case(Region::UsWest, -8)]
    #[case(Region::UsEast, -5)]
    #[case(Region::London, 1)]
    #[case(Region::Frankfurt, 2)]
    #[case(Region::Sydney, 10)]
    fn test_base_offsets(#[case] region: Region, #[case] offset: i32) {
        assert_eq!(region.base_offset(), offset);
    }
}
