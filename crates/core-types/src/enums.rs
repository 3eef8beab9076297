use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discretized market-capitalization bucket, ordered from largest to smallest.
///
/// The derived `Ord` follows declaration order, so `Mega < Large < ... < Micro`.
/// Sorting a set of tiers therefore yields the display order used by every
/// breakdown in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum McapCategory {
    Mega,
    Large,
    Mid,
    Small,
    Micro,
}

impl McapCategory {
    /// Every tier, largest first.
    pub const ALL: [McapCategory; 5] = [
        McapCategory::Mega,
        McapCategory::Large,
        McapCategory::Mid,
        McapCategory::Small,
        McapCategory::Micro,
    ];

    /// The lowest tier. Ingest drops it and sector analytics exclude it by default.
    pub const LOWEST: McapCategory = McapCategory::Micro;

    pub fn as_str(&self) -> &'static str {
        match self {
            McapCategory::Mega => "Mega",
            McapCategory::Large => "Large",
            McapCategory::Mid => "Mid",
            McapCategory::Small => "Small",
            McapCategory::Micro => "Micro",
        }
    }
}

impl fmt::Display for McapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for McapCategory {
    type Err = CoreError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        McapCategory::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnknownCategory(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("mega".parse::<McapCategory>().unwrap(), McapCategory::Mega);
        assert_eq!(" Small ".parse::<McapCategory>().unwrap(), McapCategory::Small);
        assert_eq!(
            "Nano".parse::<McapCategory>(),
            Err(CoreError::UnknownCategory("Nano".to_string()))
        );
    }

    #[test]
    fn ordering_is_largest_first() {
        let mut tiers = vec![McapCategory::Small, McapCategory::Mega, McapCategory::Mid];
        tiers.sort();
        assert_eq!(tiers, vec![McapCategory::Mega, McapCategory::Mid, McapCategory::Small]);
    }

    #[test]
    fn serializes_as_plain_label() {
        let json = serde_json::to_string(&McapCategory::Large).unwrap();
        assert_eq!(json, "\"Large\"");
    }
}
