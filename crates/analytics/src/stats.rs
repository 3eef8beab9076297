//! Statistical primitives: rounding, sample-size confidence and the bias-corrected
//! Cramér's V association between sector and market-cap tier.
//!
//! Every function here maps degenerate input (empty tables, zero denominators,
//! non-finite intermediates) to `0.0`. Nothing returned is ever NaN or infinite.

use core_types::{McapCategory, TradeRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stand-in for a zero expected cell count.
const EXPECTED_EPSILON: f64 = 1e-10;

/// Rounds half away from zero to `decimals` places. Non-finite input becomes 0.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { 0.0 }
}

/// Arithmetic mean of the finite values, `None` when there are none.
pub fn finite_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Percentage of records with a positive return, rounded to one decimal.
pub fn positive_share(records: &[TradeRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let positives = records.iter().filter(|r| r.is_positive()).count();
    round_to(positives as f64 / records.len() as f64 * 100.0, 1)
}

/// Sample-size reliability in `[0, 1]`.
///
/// `ln(count + 1) / ln(threshold + 1)` rounded to two decimals, reaching exactly 1.0
/// at `threshold`.
pub fn confidence_score(count: usize, threshold: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    if threshold == 0 || count >= threshold as usize {
        return 1.0;
    }
    let score = ((count + 1) as f64).ln() / (f64::from(threshold) + 1.0).ln();
    round_to(score, 2).clamp(0.0, 1.0)
}

/// Observed counts of a two-way categorical table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContingencyTable {
    cells: BTreeMap<(String, McapCategory), usize>,
}

impl ContingencyTable {
    /// Sector × tier counts. Records without a tier are not counted.
    pub fn from_records(records: &[TradeRecord]) -> Self {
        let cells = records
            .iter()
            .filter_map(|r| r.mcap_category.map(|tier| (r.sector.clone(), tier)))
            .counts()
            .into_iter()
            .collect();
        Self { cells }
    }

    pub fn total(&self) -> usize {
        self.cells.values().sum()
    }

    fn row_totals(&self) -> BTreeMap<&str, usize> {
        let mut totals = BTreeMap::new();
        for ((sector, _), count) in &self.cells {
            *totals.entry(sector.as_str()).or_insert(0) += count;
        }
        totals
    }

    fn column_totals(&self) -> BTreeMap<McapCategory, usize> {
        let mut totals = BTreeMap::new();
        for ((_, tier), count) in &self.cells {
            *totals.entry(*tier).or_insert(0) += count;
        }
        totals
    }

    fn observed(&self, sector: &str, tier: McapCategory) -> usize {
        self.cells
            .get(&(sector.to_string(), tier))
            .copied()
            .unwrap_or(0)
    }

    pub fn sectors(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|(sector, _)| sector.as_str()).collect()
    }

    /// Bias-corrected Cramér's V in `[0, 1]`.
    ///
    /// Zero for an empty table. `n == 1` is caught by the same guard, since a
    /// single record can never span two sectors.
    pub fn cramers_v(&self) -> f64 {
        let n = self.total();
        let rows = self.row_totals();
        let columns: BTreeMap<McapCategory, usize> = self
            .column_totals()
            .into_iter()
            .filter(|(_, total)| *total > 0)
            .collect();

        if n <= 1 || rows.len() < 2 {
            return 0.0;
        }

        let n_f = n as f64;
        let mut chi2 = 0.0;
        for (sector, row_total) in &rows {
            for (tier, column_total) in &columns {
                let mut expected = (*row_total as f64) * (*column_total as f64) / n_f;
                if expected == 0.0 {
                    expected = EXPECTED_EPSILON;
                }
                let diff = self.observed(sector, *tier) as f64 - expected;
                chi2 += diff * diff / expected;
            }
        }

        let r = rows.len() as f64;
        let k = columns.len() as f64;
        let phi2 = chi2 / n_f;
        let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (n_f - 1.0)).max(0.0);
        let r_corr = r - (r - 1.0).powi(2) / (n_f - 1.0);
        let k_corr = k - (k - 1.0).powi(2) / (n_f - 1.0);

        let denom = (k_corr - 1.0).min(r_corr - 1.0);
        if denom <= 0.0 {
            return 0.0;
        }

        let v = (phi2_corr / denom).sqrt();
        if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Association strength as a 0–100 score with one decimal.
pub fn association_score(records: &[TradeRecord]) -> f64 {
    round_to(ContingencyTable::from_records(records).cramers_v() * 100.0, 1)
}

/// Qualitative reading of an association score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrengthLabel {
    #[serde(rename = "Very Weak")]
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    #[serde(rename = "Very Strong")]
    VeryStrong,
}

impl StrengthLabel {
    /// `score` is Cramér's V × 100.
    pub fn from_score(score: f64) -> Self {
        if score > 50.0 {
            StrengthLabel::VeryStrong
        } else if score > 30.0 {
            StrengthLabel::Strong
        } else if score > 15.0 {
            StrengthLabel::Moderate
        } else if score > 5.0 {
            StrengthLabel::Weak
        } else {
            StrengthLabel::VeryWeak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLabel::VeryWeak => "Very Weak",
            StrengthLabel::Weak => "Weak",
            StrengthLabel::Moderate => "Moderate",
            StrengthLabel::Strong => "Strong",
            StrengthLabel::VeryStrong => "Very Strong",
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
