use crate::report::{KpiSummary, MostProfitable};
use crate::stats::{finite_mean, positive_share, round_to};
use configuration::SuccessRateMode;
use core_types::TradeRecord;

/// Summarizes a filtered subset.
///
/// `mode` selects which success-rate notion is reported; see `SuccessRateMode`.
/// Non-finite durations and returns are left out of the best trade and the means.
pub fn summarize(records: &[TradeRecord], mode: SuccessRateMode) -> KpiSummary {
    if records.is_empty() {
        return KpiSummary::default();
    }

    let success_rate = match mode {
        SuccessRateMode::PositiveShare => positive_share(records),
        SuccessRateMode::MeanReturn => {
            round_to(finite_mean(records.iter().map(|r| r.return_percentage)).unwrap_or(0.0), 1)
        }
    };

    KpiSummary {
        total_samples: records.len(),
        most_profitable: most_profitable(records),
        average_duration: round_to(finite_mean(records.iter().map(|r| r.duration)).unwrap_or(0.0), 1),
        success_rate,
    }
}

/// Highest finite return; on ties the first record encountered wins.
fn most_profitable(records: &[TradeRecord]) -> Option<MostProfitable> {
    let mut best: Option<&TradeRecord> = None;
    for record in records.iter().filter(|r| r.return_percentage.is_finite()) {
        match best {
            Some(current) if record.return_percentage <= current.return_percentage => {}
            _ => best = Some(record),
        }
    }

    best.map(|r| MostProfitable {
        name: r.display_name().to_string(),
        return_pct: round_to(r.return_percentage, 2),
    })
}
