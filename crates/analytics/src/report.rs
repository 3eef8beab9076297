use crate::stats::StrengthLabel;
use chrono::NaiveDate;
use core_types::McapCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The best single trade of a subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostProfitable {
    /// Company name, or the symbol when no name was recorded.
    pub name: String,
    /// Return percentage rounded to two decimals.
    #[serde(rename = "return")]
    pub return_pct: f64,
}

/// Scalar summary of a filtered subset.
///
/// An empty subset is a valid input and yields the zeroed report from `Default`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_samples: usize,
    pub most_profitable: Option<MostProfitable>,
    pub average_duration: f64,
    pub success_rate: f64,
}

/// One row of the duration × return-band histogram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBin {
    pub duration: i64,
    #[serde(rename = "20-40%")]
    pub band_20_40: usize,
    #[serde(rename = "40-60%")]
    pub band_40_60: usize,
    #[serde(rename = "60-80%")]
    pub band_60_80: usize,
    #[serde(rename = "80-100%")]
    pub band_80_100: usize,
    #[serde(rename = ">100%")]
    pub band_over_100: usize,
}

impl DurationBin {
    pub fn empty(duration: i64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.band_20_40 + self.band_40_60 + self.band_60_80 + self.band_80_100 + self.band_over_100
    }
}

/// Per-sector slice of the sector × market-cap pivot. Only tiers observed for the
/// sector appear in the maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRow {
    pub sector: String,
    /// Success rate (percentage of positive returns) per tier, flattened into the row
    /// as `"Mega": 61.5, "Large": 48.0, ...`.
    #[serde(flatten)]
    pub success_rates: BTreeMap<McapCategory, f64>,
    pub sample_counts: BTreeMap<McapCategory, usize>,
    pub confidence_scores: BTreeMap<McapCategory, f64>,
    pub avg_durations: BTreeMap<McapCategory, f64>,
}

/// Sector × market-cap breakdown with dataset-wide association statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    /// Sorted alphabetically by sector.
    pub sectors: Vec<SectorRow>,
    /// Cramér's V between sector and tier, × 100, one decimal.
    pub overall_confidence: f64,
    pub relationship_strength: StrengthLabel,
    pub total_samples: usize,
}

impl Default for SectorPerformance {
    fn default() -> Self {
        Self {
            sectors: Vec::new(),
            overall_confidence: 0.0,
            relationship_strength: StrengthLabel::VeryWeak,
            total_samples: 0,
        }
    }
}

/// Association and success rate for one holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub duration: u32,
    /// Cramér's V × 100 for this holding period.
    pub confidence: f64,
    /// Percentage of positive returns.
    pub success_rate: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// A named success rate, used by the highlights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRate {
    pub name: String,
    pub rate: f64,
}

/// Best and worst performers of a sector breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorHighlights {
    pub best_sector: RankedRate,
    pub worst_sector: RankedRate,
    pub best_mcap: Option<RankedRate>,
    pub worst_mcap: Option<RankedRate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duration_bin_always_carries_every_band() {
        let value = serde_json::to_value(DurationBin::empty(7)).unwrap();
        assert_eq!(
            value,
            json!({"duration": 7, "20-40%": 0, "40-60%": 0, "60-80%": 0, "80-100%": 0, ">100%": 0})
        );
    }

    #[test]
    fn empty_kpi_has_null_best_trade_and_zeros() {
        let value = serde_json::to_value(KpiSummary::default()).unwrap();
        assert_eq!(
            value,
            json!({"total_samples": 0, "most_profitable": null, "average_duration": 0.0, "success_rate": 0.0})
        );
    }

    #[test]
    fn sector_row_flattens_success_rates() {
        let row = SectorRow {
            sector: "Energy".to_string(),
            success_rates: BTreeMap::from([(McapCategory::Mega, 75.0)]),
            sample_counts: BTreeMap::from([(McapCategory::Mega, 4)]),
            confidence_scores: BTreeMap::from([(McapCategory::Mega, 0.47)]),
            avg_durations: BTreeMap::from([(McapCategory::Mega, 12.5)]),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["Mega"], json!(75.0));
        assert_eq!(value["sample_counts"]["Mega"], json!(4));

        let back: SectorRow = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
    }
}
