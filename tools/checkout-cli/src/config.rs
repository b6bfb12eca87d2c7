//! CLI configuration.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use checkout_core::shipping::CATALOG_CURRENCY;
use checkout_core::Currency;
use checkout_engine::{EngineConfig, DEFAULT_MAX_PENDING_ORDERS};
use checkout_observability::{LogConfig, LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// File names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = ["checkout.toml", ".checkout.toml", "checkout.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where orders and vouchers live.
    #[serde(default)]
    pub store: StoreConfig,

    /// Checkout rules.
    #[serde(default)]
    pub checkout: CheckoutConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogSection,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Engine settings derived from the file.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        self.checkout.currency()?;
        Ok(EngineConfig::default()
            .with_max_pending_orders(self.checkout.max_pending_orders)
            .with_store_timeout(self.store.timeout()))
    }

    /// Logging settings, with `-v` flags taking precedence over the file.
    pub fn log_config(&self, verbosity: u8) -> Result<LogConfig> {
        let format: LogFormat = self
            .log
            .format
            .parse()
            .with_context(|| format!("Invalid log.format: {}", self.log.format))?;
        let mut config = LogConfig::default().with_format(format);
        if verbosity > 0 {
            config = config.with_level(LogLevel::from_verbosity(verbosity));
        } else {
            config.filter = self.log.filter.clone();
        }
        Ok(config)
    }
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A `db.json` snapshot loaded into memory and written back after changes.
    #[default]
    Memory,
    /// A running json-server.
    Rest,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Rest => "rest",
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "rest" => Ok(Backend::Rest),
            other => bail!("Unknown store backend: {} (expected memory or rest)", other),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: Backend,

    /// json-server base URL for the rest backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Snapshot file for the memory backend.
    #[serde(default = "default_snapshot")]
    pub snapshot: String,

    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_snapshot() -> String {
    "db.json".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            base_url: default_base_url(),
            snapshot: default_snapshot(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Checkout rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Orders a user may have pending at once.
    #[serde(default = "default_max_pending_orders")]
    pub max_pending_orders: usize,

    /// ISO currency code. Must match the shipping catalog (VND).
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_max_pending_orders() -> usize {
    DEFAULT_MAX_PENDING_ORDERS
}

fn default_currency() -> String {
    "VND".to_string()
}

impl CheckoutConfig {
    /// The configured currency. Only the shipping catalog's currency can
    /// price a checkout.
    pub fn currency(&self) -> Result<Currency> {
        let currency = Currency::from_code(&self.currency)
            .with_context(|| format!("Unsupported currency: {}", self.currency))?;
        if currency != CATALOG_CURRENCY {
            bail!(
                "Unsupported currency: {} (shipping fees are priced in {})",
                currency,
                CATALOG_CURRENCY
            );
        }
        Ok(currency)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_pending_orders: default_max_pending_orders(),
            currency: default_currency(),
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// `human` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// `EnvFilter` directives. `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: String,
}

fn default_log_format() -> String {
    "human".to_string()
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: String::new(),
        }
    }
}

/// Generate a default checkout.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Checkout configuration

[store]
# "memory" reads and writes a db.json snapshot, "rest" talks to json-server.
backend = "memory"
snapshot = "db.json"
base_url = "http://localhost:3000"
timeout_ms = 5000

[checkout]
max_pending_orders = {cap}
currency = "VND"

[log]
format = "human"
# filter = "checkout_engine=debug"
"#,
        cap = DEFAULT_MAX_PENDING_ORDERS
    )
}
