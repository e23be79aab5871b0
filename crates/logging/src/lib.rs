use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The directives applied on top of `RUST_LOG`, keeping dependencies quiet.
const QUIET_DEPENDENCIES: &str = "alloy_sol_types=warn,alloy_primitives=warn,config=warn";

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Minimal,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "minimal" => Ok(LogFormat::Minimal),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Minimal => write!(f, "minimal"),
        }
    }
}

/// Builds the filter from `RUST_LOG`, defaulting to `info` when it is unset.
fn filter() -> EnvFilter {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    EnvFilter::new(format!("{base},{QUIET_DEPENDENCIES}"))
}

/// Initializes the logging system.
///
/// Filters out crate dependencies to reduce noise.
pub fn init(log_format: LogFormat) {
    let base = tracing_subscriber::registry().with(filter());

    match log_format {
        LogFormat::Pretty => base.with(fmt::layer().pretty()).init(),
        LogFormat::Json => base.with(fmt::layer().json()).init(),
        LogFormat::Minimal => base
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_level(true)
                    .compact(),
            )
            .init(),
    }
}
