//! Request parameters.
//!
//! The transport hands over every query parameter as an optional string. They are
//! validated exactly once, here, into a `DashboardQuery`; nothing downstream ever
//! sees a raw string.

use crate::cache::CacheKey;
use crate::filter::RecordFilter;
use chrono::NaiveDate;
use configuration::AnalyticsSettings;
use core_types::McapCategory;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Valid domain of the cooldown setting, in weeks.
pub const COOLDOWN_RANGE: RangeInclusive<u32> = 20..=104;

/// Sentinel accepted for `sector` and `mcap` meaning "no constraint".
pub const ALL_SENTINEL: &str = "All";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'weeks' must be a positive integer, got '{0}'")]
    InvalidWeeks(String),

    #[error("'cooldown_weeks' must be an integer between 20 and 104, got '{0}'")]
    CooldownOutOfRange(String),

    #[error("'{field}' must be a date in YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("'mcap' must be one of Mega, Large, Mid, Small, Micro or All, got '{0}'")]
    UnknownMcap(String),
}

/// The recognized query parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    pub weeks: Option<String>,
    pub cooldown_weeks: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sector: Option<String>,
    pub mcap: Option<String>,
}

/// Values substituted for omitted `weeks` / `cooldown_weeks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub holding_weeks: u32,
    pub cooldown_weeks: u32,
}

impl From<&AnalyticsSettings> for QueryDefaults {
    fn from(settings: &AnalyticsSettings) -> Self {
        Self {
            holding_weeks: settings.default_holding_weeks,
            cooldown_weeks: settings.default_cooldown_weeks,
        }
    }
}

/// A validated parameter set. Scoped to one backtest configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DashboardQuery {
    pub holding_weeks: u32,
    pub cooldown_weeks: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sector: Option<String>,
    pub mcap: Option<McapCategory>,
}

impl DashboardQuery {
    /// An unconstrained query for one backtest configuration.
    pub fn new(holding_weeks: u32, cooldown_weeks: u32) -> Self {
        Self {
            holding_weeks,
            cooldown_weeks,
            start_date: None,
            end_date: None,
            sector: None,
            mcap: None,
        }
    }

    pub fn from_raw(raw: RawQuery, defaults: &QueryDefaults) -> Result<Self, ValidationError> {
        Ok(Self {
            holding_weeks: parse_weeks(raw.weeks.as_deref(), defaults.holding_weeks)?,
            cooldown_weeks: parse_cooldown(raw.cooldown_weeks.as_deref(), defaults.cooldown_weeks)?,
            start_date: parse_date("start_date", raw.start_date.as_deref())?,
            end_date: parse_date("end_date", raw.end_date.as_deref())?,
            sector: parse_sector(raw.sector.as_deref()),
            mcap: parse_mcap(raw.mcap.as_deref())?,
        })
    }

    /// The filter-pipeline predicates this query stands for.
    pub fn to_filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::new()
            .holding_weeks(self.holding_weeks)
            .cooldown(self.cooldown_weeks);
        if let Some(start) = self.start_date {
            filter = filter.date_from(start);
        }
        if let Some(end) = self.end_date {
            filter = filter.date_to(end);
        }
        if let Some(sector) = &self.sector {
            filter = filter.sector(sector.clone());
        }
        if let Some(mcap) = self.mcap {
            filter = filter.mcap(mcap);
        }
        filter
    }

    /// Cache key covering every parameter that affects a result.
    pub fn cache_key(&self, computation: &str) -> CacheKey {
        CacheKey::new(computation)
            .with(self.holding_weeks)
            .with(self.cooldown_weeks)
            .with_opt(self.start_date)
            .with_opt(self.end_date)
            .with_opt(self.sector.as_deref())
            .with_opt(self.mcap)
    }
}

/// Treats blank strings as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_weeks(value: Option<&str>, default: u32) -> Result<u32, ValidationError> {
    match present(value) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|weeks| *weeks > 0)
            .ok_or_else(|| ValidationError::InvalidWeeks(raw.to_string())),
    }
}

pub fn parse_cooldown(value: Option<&str>, default: u32) -> Result<u32, ValidationError> {
    let (cooldown, raw) = match present(value) {
        None => (Some(default), default.to_string()),
        Some(raw) => (raw.parse::<u32>().ok(), raw.to_string()),
    };
    cooldown
        .filter(|c| COOLDOWN_RANGE.contains(c))
        .ok_or(ValidationError::CooldownOutOfRange(raw))
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    present(value)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn parse_sector(value: Option<&str>) -> Option<String> {
    present(value)
        .filter(|v| !v.eq_ignore_ascii_case(ALL_SENTINEL))
        .map(str::to_string)
}

fn parse_mcap(value: Option<&str>) -> Result<Option<McapCategory>, ValidationError> {
    match present(value) {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case(ALL_SENTINEL) => Ok(None),
        Some(raw) => raw
            .parse::<McapCategory>()
            .map(Some)
            .map_err(|_| ValidationError::UnknownMcap(raw.to_string())),
    }
}
