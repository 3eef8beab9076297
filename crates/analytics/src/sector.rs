//! Sector × market-cap performance pivot.
//!
//! Cells are derived from observed `(sector, tier)` groups only, so a cell never has
//! zero rows. Records without a tier are ignored throughout.

use crate::report::{RankedRate, SectorHighlights, SectorPerformance, SectorRow};
use crate::stats::{association_score, confidence_score, finite_mean, round_to, StrengthLabel};
use core_types::{McapCategory, TradeRecord};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Cell {
    total: usize,
    successes: usize,
    durations: Vec<f64>,
}

impl Cell {
    fn push(&mut self, record: &TradeRecord) {
        self.total += 1;
        if record.is_positive() {
            self.successes += 1;
        }
        self.durations.push(record.duration);
    }

    fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round_to(self.successes as f64 / self.total as f64 * 100.0, 1)
    }

    fn avg_duration(&self) -> f64 {
        round_to(finite_mean(self.durations.iter().copied()).unwrap_or(0.0), 1)
    }
}

/// Builds the per-cell breakdown and the dataset-wide association statistics.
///
/// `confidence_threshold` is the sample count at which a cell's confidence score
/// reaches 1.0.
pub fn analyze(records: &[TradeRecord], confidence_threshold: u32) -> SectorPerformance {
    let tiered: Vec<TradeRecord> = records
        .iter()
        .filter(|r| r.mcap_category.is_some())
        .cloned()
        .collect();

    if tiered.is_empty() {
        return SectorPerformance::default();
    }

    let mut pivot: BTreeMap<&str, BTreeMap<McapCategory, Cell>> = BTreeMap::new();
    for record in &tiered {
        let Some(tier) = record.mcap_category else {
            continue;
        };
        pivot
            .entry(record.sector.as_str())
            .or_default()
            .entry(tier)
            .or_default()
            .push(record);
    }

    let sectors = pivot
        .into_iter()
        .map(|(sector, cells)| SectorRow {
            sector: sector.to_string(),
            success_rates: cells.iter().map(|(t, c)| (*t, c.success_rate())).collect(),
            sample_counts: cells.iter().map(|(t, c)| (*t, c.total)).collect(),
            confidence_scores: cells
                .iter()
                .map(|(t, c)| (*t, confidence_score(c.total, confidence_threshold)))
                .collect(),
            avg_durations: cells.iter().map(|(t, c)| (*t, c.avg_duration())).collect(),
        })
        .collect();

    let overall_confidence = association_score(&tiered);

    SectorPerformance {
        sectors,
        overall_confidence,
        relationship_strength: StrengthLabel::from_score(overall_confidence),
        total_samples: tiered.len(),
    }
}

impl SectorPerformance {
    /// Best and worst sector and tier, or `None` for an empty breakdown.
    ///
    /// A sector's score is the mean of its success rates across every tier above
    /// `McapCategory::LOWEST`, counting a tier it lacks as 0. A tier's score is the
    /// mean of its non-zero success rates across sectors.
    pub fn highlights(&self) -> Option<SectorHighlights> {
        if self.sectors.is_empty() {
            return None;
        }
        let tiers: Vec<McapCategory> = McapCategory::ALL
            .into_iter()
            .filter(|tier| *tier != McapCategory::LOWEST)
            .collect();

        let mut by_sector: Vec<RankedRate> = self
            .sectors
            .iter()
            .map(|row| {
                let sum: f64 = tiers
                    .iter()
                    .map(|tier| row.success_rates.get(tier).copied().unwrap_or(0.0))
                    .sum();
                RankedRate {
                    name: row.sector.clone(),
                    rate: round_to(sum / tiers.len() as f64, 1),
                }
            })
            .collect();
        sort_descending(&mut by_sector);

        let mut by_tier: Vec<RankedRate> = tiers
            .iter()
            .filter_map(|tier| {
                let mean = finite_mean(
                    self.sectors
                        .iter()
                        .filter_map(|row| row.success_rates.get(tier).copied())
                        .filter(|rate| *rate > 0.0),
                )?;
                Some(RankedRate {
                    name: tier.to_string(),
                    rate: round_to(mean, 1),
                })
            })
            .collect();
        sort_descending(&mut by_tier);

        Some(SectorHighlights {
            best_sector: by_sector.first()?.clone(),
            worst_sector: by_sector.last()?.clone(),
            best_mcap: by_tier.first().cloned(),
            worst_mcap: by_tier.last().cloned(),
        })
    }
}

/// Stable: equal rates keep their incoming order.
fn sort_descending(rates: &mut [RankedRate]) {
    rates.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dataset, record};
    use crate::filter::RecordFilter;

    const THRESHOLD: u32 = 30;

    #[test]
    fn empty_input_is_the_zero_shape() {
        let performance = analyze(&[], THRESHOLD);
        assert!(performance.sectors.is_empty());
        assert_eq!(performance.overall_confidence, 0.0);
        assert_eq!(performance.relationship_strength, StrengthLabel::VeryWeak);
        assert_eq!(performance.total_samples, 0);
        assert!(performance.highlights().is_none());
    }

    #[test]
    fn cells_carry_rate_count_confidence_and_duration() {
        let records = vec![
            record("A", "Energy", McapCategory::Mega).duration(10.0).ret(12.0).build(),
            record("B", "Energy", McapCategory::Mega).duration(20.0).ret(-3.0).build(),
            record("C", "Energy", McapCategory::Mega).duration(15.0).ret(0.0).build(),
            record("D", "Auto", McapCategory::Small).duration(7.0).ret(30.0).build(),
        ];

        let performance = analyze(&records, THRESHOLD);

        let sectors: Vec<&str> = performance.sectors.iter().map(|r| r.sector.as_str()).collect();
        assert_eq!(sectors, vec!["Auto", "Energy"]);

        let energy = &performance.sectors[1];
        assert_eq!(energy.success_rates[&McapCategory::Mega], 33.3);
        assert_eq!(energy.sample_counts[&McapCategory::Mega], 3);
        assert_eq!(energy.avg_durations[&McapCategory::Mega], 15.0);
        // ln(4) / ln(31) = 0.4037...
        assert_eq!(energy.confidence_scores[&McapCategory::Mega], 0.4);
        assert!(!energy.sample_counts.contains_key(&McapCategory::Small));

        assert_eq!(performance.total_samples, 4);
    }

    #[test]
    fn unobserved_groups_are_never_emitted() {
        let subset = RecordFilter::new()
            .holding_weeks(52)
            .exclude_mcap(McapCategory::Micro)
            .apply(&dataset());
        let performance = analyze(&subset, THRESHOLD);

        for row in &performance.sectors {
            assert!(row.sample_counts.values().all(|count| *count > 0));
            assert!(!row.success_rates.contains_key(&McapCategory::Micro));
            assert_eq!(
                row.success_rates.keys().collect::<Vec<_>>(),
                row.sample_counts.keys().collect::<Vec<_>>()
            );
        }
        assert!(!performance.sectors.iter().any(|row| row.sector == "Nonexistent"));
    }

    #[test]
    fn records_without_tier_are_ignored() {
        let mut orphan = record("X", "Retail", McapCategory::Mega).build();
        orphan.mcap_category = None;
        let records = vec![orphan, record("Y", "Energy", McapCategory::Mid).build()];

        let performance = analyze(&records, THRESHOLD);
        assert_eq!(performance.total_samples, 1);
        assert_eq!(performance.sectors.len(), 1);
        assert_eq!(performance.sectors[0].sector, "Energy");
    }

    #[test]
    fn disjoint_sectors_report_very_strong_relationship() {
        let records: Vec<TradeRecord> = (0..10)
            .map(|i| record(&format!("T{i}"), "Tech", McapCategory::Mega).build())
            .chain((0..10).map(|i| record(&format!("E{i}"), "Energy", McapCategory::Small).build()))
            .collect();

        let performance = analyze(&records, THRESHOLD);
        assert_eq!(performance.overall_confidence, 100.0);
        assert_eq!(performance.relationship_strength, StrengthLabel::VeryStrong);
    }

    #[test]
    fn highlights_rank_sectors_and_tiers() {
        let records = vec![
            record("A", "Energy", McapCategory::Mega).ret(10.0).build(),
            record("B", "Energy", McapCategory::Large).ret(10.0).build(),
            record("C", "Auto", McapCategory::Mega).ret(10.0).build(),
            record("D", "Auto", McapCategory::Large).ret(-10.0).build(),
        ];
        let highlights = analyze(&records, THRESHOLD).highlights().unwrap();

        // Missing Mid and Small count as 0 in a four-tier average.
        assert_eq!(highlights.best_sector.name, "Energy");
        assert_eq!(highlights.best_sector.rate, 50.0);
        assert_eq!(highlights.worst_sector.name, "Auto");
        assert_eq!(highlights.worst_sector.rate, 25.0);
        // Auto/Large is 0% and does not drag the Large average down.
        let best_mcap = highlights.best_mcap.unwrap();
        assert_eq!(best_mcap.name, "Mega");
        assert_eq!(best_mcap.rate, 100.0);
        assert_eq!(highlights.worst_mcap.unwrap().rate, 100.0);
    }
}
