//! Market-capitalization categorization.
//!
//! The one place that decides which tier a symbol belongs to. Tiers are assigned by
//! rank in a capitalization snapshot (largest company = rank 0); symbols absent from
//! the snapshot fall back to `McapCategory::LOWEST`.

use crate::enums::McapCategory;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Exclusive upper rank bounds for each tier. Anything at or beyond `small` is Micro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RankBands {
    pub mega: usize,
    pub large: usize,
    pub mid: usize,
    pub small: usize,
}

impl Default for RankBands {
    fn default() -> Self {
        Self {
            mega: 50,
            large: 100,
            mid: 250,
            small: 500,
        }
    }
}

impl RankBands {
    /// Maps a 0-based capitalization rank onto its tier.
    pub fn tier_for_rank(&self, rank: usize) -> McapCategory {
        if rank < self.mega {
            McapCategory::Mega
        } else if rank < self.large {
            McapCategory::Large
        } else if rank < self.mid {
            McapCategory::Mid
        } else if rank < self.small {
            McapCategory::Small
        } else {
            McapCategory::Micro
        }
    }

    /// Bands must be strictly increasing for every tier to be reachable.
    pub fn is_ordered(&self) -> bool {
        self.mega < self.large && self.large < self.mid && self.mid < self.small
    }
}

/// Parses a capitalization figure such as `"1,23,456.78"`.
///
/// Thousands separators are stripped. Returns `None` for blank, unparseable or
/// non-finite input.
pub fn parse_capitalization(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Ranks a snapshot by descending capitalization and assigns each symbol its tier.
///
/// Entries with an unknown capitalization sort after every known one, keeping their
/// snapshot order among themselves.
pub fn categorize_snapshot<I>(snapshot: I, bands: &RankBands) -> HashMap<String, McapCategory>
where
    I: IntoIterator<Item = (String, Option<f64>)>,
{
    let mut entries: Vec<(String, Option<f64>)> = snapshot.into_iter().collect();
    entries.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    entries
        .into_iter()
        .enumerate()
        .map(|(rank, (symbol, _))| (symbol, bands.tier_for_rank(rank)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_band_edges() {
        let bands = RankBands::default();
        assert_eq!(bands.tier_for_rank(0), McapCategory::Mega);
        assert_eq!(bands.tier_for_rank(49), McapCategory::Mega);
        assert_eq!(bands.tier_for_rank(50), McapCategory::Large);
        assert_eq!(bands.tier_for_rank(99), McapCategory::Large);
        assert_eq!(bands.tier_for_rank(100), McapCategory::Mid);
        assert_eq!(bands.tier_for_rank(249), McapCategory::Mid);
        assert_eq!(bands.tier_for_rank(250), McapCategory::Small);
        assert_eq!(bands.tier_for_rank(499), McapCategory::Small);
        assert_eq!(bands.tier_for_rank(500), McapCategory::Micro);
    }

    #[test]
    fn unordered_bands_are_detected() {
        let bands = RankBands {
            mega: 100,
            large: 50,
            ..RankBands::default()
        };
        assert!(!bands.is_ordered());
        assert!(RankBands::default().is_ordered());
    }

    #[test]
    fn capitalization_strips_separators() {
        assert_eq!(parse_capitalization("1,23,456.5"), Some(123456.5));
        assert_eq!(parse_capitalization(" 42 "), Some(42.0));
        assert_eq!(parse_capitalization(""), None);
        assert_eq!(parse_capitalization("n/a"), None);
    }

    #[test]
    fn snapshot_is_ranked_by_descending_capitalization() {
        let bands = RankBands {
            mega: 1,
            large: 2,
            mid: 3,
            small: 4,
        };
        let snapshot = vec![
            ("SMALLCO".to_string(), Some(10.0)),
            ("UNKNOWN".to_string(), None),
            ("BIGCO".to_string(), Some(1_000.0)),
            ("MIDCO".to_string(), Some(100.0)),
        ];

        let tiers = categorize_snapshot(snapshot, &bands);

        assert_eq!(tiers["BIGCO"], McapCategory::Mega);
        assert_eq!(tiers["MIDCO"], McapCategory::Large);
        assert_eq!(tiers["SMALLCO"], McapCategory::Mid);
        assert_eq!(tiers["UNKNOWN"], McapCategory::Small);
    }
}
