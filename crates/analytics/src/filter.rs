//! The filter pipeline shared by every query type.
//!
//! A `RecordFilter` is an ordered list of `Predicate`s combined by conjunction.
//! Order only matters to a store's query planner, never to the resulting subset.

use chrono::NaiveDate;
use core_types::{McapCategory, TradeRecord};
use serde::Serialize;

/// A single attribute constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Predicate {
    HoldingWeeks(u32),
    Cooldown(u32),
    /// Inclusive lower bound on `breakout_date`.
    DateFrom(NaiveDate),
    /// Inclusive upper bound on `breakout_date`.
    DateTo(NaiveDate),
    Sector(String),
    Mcap(McapCategory),
    /// Keeps only records whose tier is known and differs from the given one.
    ExcludeMcap(McapCategory),
}

impl Predicate {
    pub fn matches(&self, record: &TradeRecord) -> bool {
        match self {
            Predicate::HoldingWeeks(weeks) => record.holding_weeks == *weeks,
            Predicate::Cooldown(cooldown) => record.cooldown_setting == *cooldown,
            Predicate::DateFrom(start) => record.breakout_date >= *start,
            Predicate::DateTo(end) => record.breakout_date <= *end,
            Predicate::Sector(sector) => record.sector == *sector,
            Predicate::Mcap(tier) => record.mcap_category == Some(*tier),
            Predicate::ExcludeMcap(tier) => {
                matches!(record.mcap_category, Some(actual) if actual != *tier)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RecordFilter {
    predicates: Vec<Predicate>,
}

impl RecordFilter {
    /// A filter with no constraints; matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn holding_weeks(self, weeks: u32) -> Self {
        self.with(Predicate::HoldingWeeks(weeks))
    }

    pub fn cooldown(self, cooldown: u32) -> Self {
        self.with(Predicate::Cooldown(cooldown))
    }

    pub fn date_from(self, start: NaiveDate) -> Self {
        self.with(Predicate::DateFrom(start))
    }

    pub fn date_to(self, end: NaiveDate) -> Self {
        self.with(Predicate::DateTo(end))
    }

    pub fn sector(self, sector: impl Into<String>) -> Self {
        self.with(Predicate::Sector(sector.into()))
    }

    pub fn mcap(self, tier: McapCategory) -> Self {
        self.with(Predicate::Mcap(tier))
    }

    pub fn exclude_mcap(self, tier: McapCategory) -> Self {
        self.with(Predicate::ExcludeMcap(tier))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, record: &TradeRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// The matching subset, in input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<TradeRecord>
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
