use crate::enums::McapCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One labeled trade outcome from a backtest configuration.
///
/// Records are created in bulk at ingest time and never mutated afterwards.
/// `(cooldown_setting, holding_weeks)` identifies the backtest configuration the
/// record belongs to; the same `symbol` may appear in many configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub company: Option<String>,
    pub sector: String,
    /// `None` when the stored label is not a known tier. Such records are
    /// ingestion failures and take no part in sector/market-cap analytics.
    pub mcap_category: Option<McapCategory>,
    /// Weeks, valid domain [20, 104].
    pub cooldown_setting: u32,
    pub holding_weeks: u32,
    pub breakout_date: NaiveDate,
    /// Holding duration in weeks.
    pub duration: f64,
    pub return_percentage: f64,
}

impl TradeRecord {
    /// The company name when present and non-blank, otherwise the symbol.
    pub fn display_name(&self) -> &str {
        match self.company.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.symbol,
        }
    }

    /// True when both numeric measures can enter a ranking or a mean.
    pub fn has_finite_metrics(&self) -> bool {
        self.duration.is_finite() && self.return_percentage.is_finite()
    }

    pub fn is_positive(&self) -> bool {
        self.return_percentage > 0.0
    }
}
