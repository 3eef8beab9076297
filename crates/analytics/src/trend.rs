use crate::report::TrendPoint;
use crate::stats::{association_score, round_to};
use core_types::TradeRecord;

/// Association and success rate of one holding period's records.
///
/// Only records with a tier count, as in the sector breakdown. Returns `None` when
/// none remain so the caller can leave the duration out of the series.
pub fn trend_point(duration: u32, records: &[TradeRecord]) -> Option<TrendPoint> {
    let tiered: Vec<&TradeRecord> = records
        .iter()
        .filter(|r| r.mcap_category.is_some())
        .collect();
    if tiered.is_empty() {
        return None;
    }
    let positives = tiered.iter().filter(|r| r.is_positive()).count();
    Some(TrendPoint {
        duration,
        confidence: association_score(records),
        success_rate: round_to(positives as f64 / tiered.len() as f64 * 100.0, 1),
        sample_size: tiered.len(),
    })
}

/// Assembles the series in ascending duration order, skipping empty subsets.
pub fn build_trend<'a, I>(subsets: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = (u32, &'a [TradeRecord])>,
{
    let mut points: Vec<TrendPoint> = subsets
        .into_iter()
        .filter_map(|(duration, records)| trend_point(duration, records))
        .collect();
    points.sort_by_key(|point| point.duration);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use core_types::McapCategory;

    #[test]
    fn empty_duration_is_skipped() {
        let populated = vec![
            record("A", "Tech", McapCategory::Mega).ret(5.0).build(),
            record("B", "Energy", McapCategory::Small).ret(-5.0).build(),
        ];
        let empty: Vec<TradeRecord> = Vec::new();

        let points = build_trend([(78, empty.as_slice()), (52, populated.as_slice())]);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].duration, 52);
        assert_eq!(points[0].sample_size, 2);
        assert_eq!(points[0].success_rate, 50.0);
    }

    #[test]
    fn points_are_sorted_by_duration() {
        let a = vec![record("A", "Tech", McapCategory::Mega).build()];
        let b = vec![record("B", "Tech", McapCategory::Mega).build()];

        let points = build_trend([(208, a.as_slice()), (26, b.as_slice())]);
        let durations: Vec<u32> = points.iter().map(|p| p.duration).collect();
        assert_eq!(durations, vec![26, 208]);
    }

    #[test]
    fn untiered_records_are_left_out() {
        let mut untiered = record("X", "Energy", McapCategory::Mega).ret(-40.0).build();
        untiered.mcap_category = None;
        let records = vec![
            record("A", "Tech", McapCategory::Mega).ret(5.0).build(),
            record("B", "Tech", McapCategory::Large).ret(-5.0).build(),
            untiered.clone(),
        ];

        let point = trend_point(52, &records).unwrap();
        assert_eq!(point.sample_size, 2);
        assert_eq!(point.success_rate, 50.0);
        assert!(trend_point(52, &[untiered]).is_none());
    }

    #[test]
    fn single_sector_has_zero_confidence() {
        let records: Vec<TradeRecord> = (0..5)
            .map(|i| record(&format!("S{i}"), "Tech", McapCategory::Mega).build())
            .collect();
        let point = trend_point(52, &records).unwrap();
        assert_eq!(point.confidence, 0.0);
        assert_eq!(point.success_rate, 100.0);
    }
}
