use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use seda_logging::LogFormat;

/// Settings for the replay.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// The format for logging.
    pub log_format: LogFormat,
    /// Overrides the timeout period of the replay input, in seconds.
    pub timeout_period: Option<u64>,
    /// Overrides the max batch age of the replay input.
    pub max_batch_age: Option<u64>,
}

impl Settings {
    /// Create a new Settings instance from environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("log_format", "minimal")?
            .add_source(Environment::with_prefix("SEDA"))
            .build()?;

        config.try_deserialize()
    }
}
