//! Duration × return-band histogram of successful trades.

use crate::report::DurationBin;
use core_types::TradeRecord;
use std::collections::BTreeMap;

/// Minimum return (inclusive) for a trade to enter the histogram.
pub const SUCCESS_THRESHOLD: f64 = 20.0;

/// Return bands with edges `[20, 40, 60, 80, 100, +inf)`, each left-inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReturnBand {
    From20To40,
    From40To60,
    From60To80,
    From80To100,
    Over100,
}

impl ReturnBand {
    pub const ALL: [ReturnBand; 5] = [
        ReturnBand::From20To40,
        ReturnBand::From40To60,
        ReturnBand::From60To80,
        ReturnBand::From80To100,
        ReturnBand::Over100,
    ];

    /// `None` below the success threshold or for non-finite input.
    pub fn from_return(return_percentage: f64) -> Option<Self> {
        if !return_percentage.is_finite() || return_percentage < SUCCESS_THRESHOLD {
            return None;
        }
        Some(if return_percentage < 40.0 {
            ReturnBand::From20To40
        } else if return_percentage < 60.0 {
            ReturnBand::From40To60
        } else if return_percentage < 80.0 {
            ReturnBand::From60To80
        } else if return_percentage < 100.0 {
            ReturnBand::From80To100
        } else {
            ReturnBand::Over100
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReturnBand::From20To40 => "20-40%",
            ReturnBand::From40To60 => "40-60%",
            ReturnBand::From60To80 => "60-80%",
            ReturnBand::From80To100 => "80-100%",
            ReturnBand::Over100 => ">100%",
        }
    }
}

impl DurationBin {
    pub fn add(&mut self, band: ReturnBand) {
        let slot = match band {
            ReturnBand::From20To40 => &mut self.band_20_40,
            ReturnBand::From40To60 => &mut self.band_40_60,
            ReturnBand::From60To80 => &mut self.band_60_80,
            ReturnBand::From80To100 => &mut self.band_80_100,
            ReturnBand::Over100 => &mut self.band_over_100,
        };
        *slot += 1;
    }

    pub fn count(&self, band: ReturnBand) -> usize {
        match band {
            ReturnBand::From20To40 => self.band_20_40,
            ReturnBand::From40To60 => self.band_40_60,
            ReturnBand::From60To80 => self.band_60_80,
            ReturnBand::From80To100 => self.band_80_100,
            ReturnBand::Over100 => self.band_over_100,
        }
    }
}

/// Rounds half to even, so 2.5 weeks groups with 2 and 3.5 weeks with 4.
pub fn round_duration(duration: f64) -> i64 {
    duration.round_ties_even() as i64
}

/// Buckets every successful trade by rounded duration and return band.
///
/// One row per distinct rounded duration, ascending. Trades below
/// `SUCCESS_THRESHOLD` or with a non-finite duration are left out.
pub fn bin_durations(records: &[TradeRecord]) -> Vec<DurationBin> {
    let mut rows: BTreeMap<i64, DurationBin> = BTreeMap::new();

    for record in records.iter().filter(|r| r.duration.is_finite()) {
        let Some(band) = ReturnBand::from_return(record.return_percentage) else {
            continue;
        };
        let duration = round_duration(record.duration);
        rows.entry(duration)
            .or_insert_with(|| DurationBin::empty(duration))
            .add(band);
    }

    rows.into_values().collect()
}
