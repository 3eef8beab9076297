use core_types::{McapCategory, RankBands};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section and field has a default, so an absent `config.toml` yields a
/// working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub analytics: AnalyticsSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub ingest: IngestSettings,
}

/// Where the HTTP transport listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Which of the two success-rate notions the KPI summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SuccessRateMode {
    /// Percentage of records with a positive return.
    #[default]
    PositiveShare,
    /// Arithmetic mean of the raw return percentage.
    MeanReturn,
}

/// Parameters of the aggregation engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Holding period used when a request omits `weeks`.
    pub default_holding_weeks: u32,
    /// Cooldown used when a request omits `cooldown_weeks`.
    pub default_cooldown_weeks: u32,
    /// The enumerated holding periods; also the x-axis of the trend view.
    pub holding_periods: Vec<u32>,
    /// Cooldown the trend view is computed for.
    pub trend_cooldown_weeks: u32,
    /// Sample count at which the confidence score reaches 1.0.
    pub confidence_threshold: u32,
    /// Tier left out of sector analytics. `None` keeps every tier.
    pub excluded_tier: Option<McapCategory>,
    pub kpi_success_rate: SuccessRateMode,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_holding_weeks: 52,
            default_cooldown_weeks: 52,
            holding_periods: vec![26, 52, 78, 104, 156, 208],
            trend_cooldown_weeks: 52,
            confidence_threshold: 30,
            excluded_tier: Some(McapCategory::LOWEST),
            kpi_success_rate: SuccessRateMode::PositiveShare,
        }
    }
}

/// Time-to-live policy for each kind of cached result.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Min/max breakout date lookups.
    #[serde(with = "humantime_serde")]
    pub date_range_ttl: Duration,
    /// Sector performance, trend and sector list.
    #[serde(with = "humantime_serde")]
    pub analysis_ttl: Duration,
    /// KPI summary and duration chart.
    #[serde(with = "humantime_serde")]
    pub query_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            date_range_ttl: Duration::from_secs(5 * 60),
            analysis_ttl: Duration::from_secs(10 * 60),
            query_ttl: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "tradescope.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub rank_bands: RankBands,
    /// Rows per INSERT statement during bulk load.
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            rank_bands: RankBands::default(),
            batch_size: 5_000,
        }
    }
}
