//! Subscriber installation with JSON or human output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown by default.
const CRATES: [&str; 4] = ["checkout_core", "checkout_store", "checkout_engine", "checkout_cli"];

/// Log level for the default filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level for a `-v` count: 0 is warn, 1 info, 2 debug, 3+ trace.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `EnvFilter` directive enabling this level for the checkout crates.
    pub fn directive(&self) -> String {
        CRATES
            .iter()
            .map(|krate| format!("{krate}={}", self.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (for log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "human" | "pretty" | "text" => Ok(Self::Human),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Human => f.write_str("human"),
        }
    }
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Logging already initialised: {0}")]
    AlreadyInitialised(String),
}

/// How logs are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// `EnvFilter` directives. Empty uses `level` for the checkout crates.
    #[serde(default)]
    pub filter: String,
    /// Level used when no filter is given.
    #[serde(default)]
    pub level: LogLevel,
}

impl LogConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Filter directives in effect: `RUST_LOG`, then `filter`, then `level`.
    pub fn effective_filter(&self, rust_log: Option<&str>) -> String {
        rust_log
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| Some(self.filter.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| self.level.directive())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let rust_log = std::env::var("RUST_LOG").ok();
        let directives = self.effective_filter(rust_log.as_deref());
        EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter(format!("{directives}: {e}")))
    }
}

/// Install the global subscriber. Logs go to stderr.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Human => builder.with_target(false).try_init(),
    };
    result.map_err(|e| LoggingError::AlreadyInitialised(e.to_string()))
}
