//! Fixtures shared by the unit tests of this crate.

use chrono::NaiveDate;
use core_types::{McapCategory, TradeRecord};

pub struct RecordBuilder {
    record: TradeRecord,
}

/// A 52-week / 52-cooldown record with a 10-week duration and a 25% return.
pub fn record(symbol: &str, sector: &str, tier: McapCategory) -> RecordBuilder {
    RecordBuilder {
        record: TradeRecord {
            symbol: symbol.to_string(),
            company: None,
            sector: sector.to_string(),
            mcap_category: Some(tier),
            cooldown_setting: 52,
            holding_weeks: 52,
            breakout_date: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid fixture date"),
            duration: 10.0,
            return_percentage: 25.0,
        },
    }
}

impl RecordBuilder {
    pub fn weeks(mut self, weeks: u32) -> Self {
        self.record.holding_weeks = weeks;
        self
    }

    pub fn cooldown(mut self, cooldown: u32) -> Self {
        self.record.cooldown_setting = cooldown;
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.record.duration = duration;
        self
    }

    pub fn ret(mut self, return_percentage: f64) -> Self {
        self.record.return_percentage = return_percentage;
        self
    }

    pub fn company(mut self, company: &str) -> Self {
        self.record.company = Some(company.to_string());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> TradeRecord {
        self.record.breakout_date = date;
        self.record
    }

    pub fn build(self) -> TradeRecord {
        self.record
    }
}

/// A small mixed dataset: two configurations, three sectors, four tiers.
pub fn dataset() -> Vec<TradeRecord> {
    vec![
        record("TCS", "Technology", McapCategory::Mega).duration(12.0).ret(45.0).build(),
        record("INFY", "Technology", McapCategory::Mega).duration(20.0).ret(-5.0).build(),
        record("LTIM", "Technology", McapCategory::Large).duration(8.0).ret(110.0).build(),
        record("ONGC", "Energy", McapCategory::Mega).duration(30.0).ret(22.0).build(),
        record("GAIL", "Energy", McapCategory::Mid).duration(15.0).ret(-12.0).build(),
        record("SUNP", "Pharma", McapCategory::Large).duration(5.0).ret(65.0).build(),
        record("LUPIN", "Pharma", McapCategory::Small).duration(9.0).ret(0.0).build(),
        record("MICRO1", "Pharma", McapCategory::Micro).duration(4.0).ret(300.0).build(),
        record("TCS", "Technology", McapCategory::Mega).weeks(104).duration(40.0).ret(80.0).build(),
        record("ONGC", "Energy", McapCategory::Mega).weeks(104).cooldown(20).ret(10.0).build(),
    ]
}
