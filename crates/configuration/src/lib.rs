use crate::error::ConfigError;
use config::{Environment, File, FileFormat};

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalyticsSettings, CacheSettings, IngestSettings, LoggingSettings, ServerSettings, Settings,
    SuccessRateMode,
};

/// Prefix for environment overrides, e.g. `TRADESCOPE__SERVER__PORT=8080`.
const ENV_PREFIX: &str = "TRADESCOPE";

/// Loads the application configuration.
///
/// Reads `path` (a missing file is not an error, every field has a default), layers
/// `TRADESCOPE__SECTION__KEY` environment variables on top, deserializes the result
/// into our strongly-typed `Settings` and validates it.
pub fn load_config(path: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("analytics.holding_periods"),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;
    Ok(settings)
}

/// Parses settings from an in-memory TOML document. No environment layering.
pub fn load_config_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize::<Settings>()?;
    validate(&settings)?;
    Ok(settings)
}

/// Rejects settings the engine cannot run with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.server.port == 0 {
        return Err(ConfigError::ValidationError("server.port must be non-zero".to_string()));
    }
    if settings.analytics.holding_periods.is_empty() {
        return Err(ConfigError::ValidationError(
            "analytics.holding_periods must list at least one period".to_string(),
        ));
    }
    if settings.analytics.confidence_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "analytics.confidence_threshold must be positive".to_string(),
        ));
    }
    if !settings.ingest.rank_bands.is_ordered() {
        return Err(ConfigError::ValidationError(
            "ingest.rank_bands must be strictly increasing".to_string(),
        ));
    }
    if settings.ingest.batch_size == 0 {
        return Err(ConfigError::ValidationError("ingest.batch_size must be positive".to_string()));
    }
    Ok(())
}
