use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(AppError::InvalidInput(format!(
                "invalid log format '{other}', expected json or text"
            ))),
        }
    }
}

pub fn parse_level(level: &str) -> Result<Level, AppError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(AppError::InvalidInput(format!(
            "invalid log level '{other}', expected debug, info, warn or error"
        ))),
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str, format: &str) -> Result<(), AppError> {
    let level = parse_level(level)?;
    let format: LogFormat = format.parse()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| AppError::Initialization(e.to_string()))
}
