//! The record-store seam.
//!
//! The engine reads trade records through `TradeStore` and never writes them. The
//! Postgres adapter lives in the `database` crate; `InMemoryStore` backs tests and
//! offline use.

use crate::filter::RecordFilter;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::TradeRecord;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record store returned malformed data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Every record satisfying `filter`.
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TradeRecord>, StoreError>;

    /// Earliest and latest `breakout_date` for one backtest configuration, or `None`
    /// when the configuration has no records.
    async fn date_range(
        &self,
        holding_weeks: u32,
        cooldown: u32,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError>;

    /// Distinct sector labels, alphabetically sorted.
    async fn sectors(&self) -> Result<Vec<String>, StoreError>;
}

/// A store over an owned vector of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<TradeRecord>,
}

impl InMemoryStore {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TradeStore for InMemoryStore {
    async fn fetch(&self, filter: &RecordFilter) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(filter.apply(&self.records))
    }

    async fn date_range(
        &self,
        holding_weeks: u32,
        cooldown: u32,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
        let dates = self
            .records
            .iter()
            .filter(|r| r.holding_weeks == holding_weeks && r.cooldown_setting == cooldown)
            .map(|r| r.breakout_date);

        Ok(dates.fold(None, |range, date| match range {
            None => Some((date, date)),
            Some((min, max)) => Some((min.min(date), max.max(date))),
        }))
    }

    async fn sectors(&self) -> Result<Vec<String>, StoreError> {
        let distinct: BTreeSet<&str> = self.records.iter().map(|r| r.sector.as_str()).collect();
        Ok(distinct.into_iter().map(str::to_string).collect())
    }
}
