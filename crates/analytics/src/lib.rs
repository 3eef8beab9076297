//! # Tradescope Analytics Engine
//!
//! Turns the stored backtest trade records into the dashboard's analytical views:
//! a KPI summary, a duration × return-band histogram, a sector × market-cap
//! breakdown with a bias-corrected Cramér's V, and an association trend across
//! holding periods.
//!
//! ## Architectural Principles
//!
//! - **Pure computations, async façade:** `kpi`, `binning`, `sector` and `trend` are
//!   plain functions over record slices. `AnalyticsEngine` wires them to a
//!   `TradeStore` and a `ResultCache`.
//! - **Validated input:** request parameters are parsed once into a `DashboardQuery`
//!   by `params`; the computations never see raw strings.
//! - **No NaN out:** every statistic maps degenerate input to a finite value.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the cached entry point used by the web server and the CLI.
//! - `DashboardQuery` / `RawQuery`: request parameters before and after validation.
//! - `TradeStore` / `ResultCache`: the collaborator seams.
//! - `AnalyticsError`: the errors this crate can return.

pub mod binning;
pub mod cache;
pub mod engine;
pub mod error;
pub mod filter;
pub mod kpi;
pub mod params;
pub mod report;
pub mod sector;
pub mod stats;
pub mod store;
pub mod trend;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, InMemoryCache, ResultCache};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use filter::{Predicate, RecordFilter};
pub use params::{DashboardQuery, QueryDefaults, RawQuery, ValidationError};
pub use report::{
    DateRange, DurationBin, KpiSummary, MostProfitable, RankedRate, SectorHighlights,
    SectorPerformance, SectorRow, TrendPoint,
};
pub use stats::StrengthLabel;
pub use store::{InMemoryStore, StoreError, TradeStore};
