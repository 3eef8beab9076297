//! CSV readers for the capitalization snapshot and the backtest result files.

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use core_types::{McapCategory, RankBands, TradeRecord, categorize_snapshot, parse_capitalization};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// Sector assigned when a backtest row leaves it blank.
const FALLBACK_SECTOR: &str = "Other";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(rename = "NSE Symbol")]
    symbol: String,
    #[serde(rename = "Market Capitalisation")]
    capitalization: String,
}

#[derive(Debug, Deserialize)]
struct BacktestRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Company", default)]
    company: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "Cooldown Setting", deserialize_with = "csv::invalid_option")]
    cooldown: Option<f64>,
    #[serde(rename = "Breakout Date")]
    breakout_date: String,
    #[serde(rename = "Duration", deserialize_with = "csv::invalid_option")]
    duration: Option<f64>,
    #[serde(
        rename = "12-Month %",
        alias = "12-month %",
        deserialize_with = "csv::invalid_option"
    )]
    return_percentage: Option<f64>,
}

/// What happened to the rows of one backtest file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub read: usize,
    pub kept: usize,
    /// Rows whose symbol ranks in the lowest tier or is missing from the snapshot.
    pub lowest_tier: usize,
    /// Rows with a missing or non-finite number, or an unreadable date.
    pub invalid: usize,
}

impl std::ops::AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.read += other.read;
        self.kept += other.kept;
        self.lowest_tier += other.lowest_tier;
        self.invalid += other.invalid;
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Reads the snapshot and assigns every listed symbol its tier.
pub fn read_snapshot<R: Read>(
    reader: R,
    bands: &RankBands,
) -> anyhow::Result<HashMap<String, McapCategory>> {
    let mut entries = Vec::new();
    for (line, row) in csv_reader(reader).deserialize::<SnapshotRow>().enumerate() {
        let row = row.with_context(|| format!("snapshot row {}", line + 1))?;
        entries.push((row.symbol, parse_capitalization(&row.capitalization)));
    }
    Ok(categorize_snapshot(entries, bands))
}

fn parse_breakout_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads one backtest file, tagging every row with `holding_weeks`.
///
/// Symbols absent from `tiers` take the lowest tier. Lowest-tier rows and rows with
/// unusable numbers are dropped and counted.
pub fn read_backtest<R: Read>(
    reader: R,
    holding_weeks: u32,
    tiers: &HashMap<String, McapCategory>,
) -> anyhow::Result<(Vec<TradeRecord>, IngestStats)> {
    let mut records = Vec::new();
    let mut stats = IngestStats::default();

    for (line, row) in csv_reader(reader).deserialize::<BacktestRow>().enumerate() {
        let row = row.with_context(|| format!("backtest row {}", line + 1))?;
        stats.read += 1;

        let tier = tiers
            .get(&row.symbol)
            .copied()
            .unwrap_or(McapCategory::LOWEST);
        if tier == McapCategory::LOWEST {
            stats.lowest_tier += 1;
            continue;
        }

        let cooldown = row
            .cooldown
            .filter(|c| c.is_finite() && *c >= 0.0 && c.fract() == 0.0 && *c <= f64::from(u32::MAX));
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        let (Some(cooldown), Some(duration), Some(return_percentage), Some(breakout_date)) = (
            cooldown,
            finite(row.duration),
            finite(row.return_percentage),
            parse_breakout_date(&row.breakout_date),
        ) else {
            stats.invalid += 1;
            continue;
        };

        records.push(TradeRecord {
            symbol: row.symbol,
            company: non_blank(row.company),
            sector: non_blank(row.sector).unwrap_or_else(|| FALLBACK_SECTOR.to_string()),
            mcap_category: Some(tier),
            cooldown_setting: cooldown as u32,
            holding_weeks,
            breakout_date,
            duration,
            return_percentage,
        });
        stats.kept += 1;
    }

    Ok((records, stats))
}
