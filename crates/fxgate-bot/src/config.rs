//! Application configuration.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fxgate_broker::Environment;
use fxgate_core::{BotPriority, OrderSide};
use fxgate_engine::GuardChainConfig;

use crate::error::{AppError, AppResult};

/// Instrument entry. The UIC may be pinned here or resolved at startup
/// through the reference-data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// FX symbol, e.g. "USDJPY".
    pub symbol: String,
    /// Pinned UIC; resolved via the API when absent.
    #[serde(default)]
    pub uic: Option<u32>,
    /// Price-to-pips conversion factor for this symbol.
    #[serde(default)]
    pub pip_factor: Option<f64>,
}

/// Order status polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Hard ceiling on status polling, seconds. Default: 30.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,
    /// Interval between status polls, seconds. Default: 2.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
}

fn default_max_wait_seconds() -> u64 {
    30
}

fn default_poll_interval_seconds() -> u64 {
    2
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_wait_seconds: default_max_wait_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
        }
    }
}

/// Top-level application configuration.
///
/// Credentials never live here; they come from `{SIM,LIVE}_*` environment
/// variables (see `BrokerConfig::from_env`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// "sim" or "live". Default: sim.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Identity in the priority registry.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,
    /// Priority class for cross-bot coordination.
    #[serde(default)]
    pub priority: BotPriority,
    /// Instruments to trade each cycle.
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentConfig>,
    /// Order side for the candidate order each cycle.
    #[serde(default = "default_side")]
    pub side: OrderSide,
    /// Order size in lots.
    #[serde(default = "default_amount_lots")]
    pub amount_lots: Decimal,
    /// Seconds between trading cycles.
    #[serde(default = "default_cycle_interval_seconds")]
    pub cycle_interval_seconds: u64,
    /// Use the v3 trade endpoints.
    #[serde(default)]
    pub use_trade_v3: bool,
    /// Directory for the JSON Lines trade journal.
    #[serde(default = "default_journal_dir")]
    pub journal_dir: String,
    #[serde(default)]
    pub guards: GuardChainConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

fn default_environment() -> String {
    "sim".to_string()
}

fn default_bot_id() -> String {
    "fxgate-bot".to_string()
}

fn default_instruments() -> Vec<InstrumentConfig> {
    vec![InstrumentConfig {
        symbol: "USDJPY".to_string(),
        uic: None,
        pip_factor: None,
    }]
}

fn default_side() -> OrderSide {
    OrderSide::Buy
}

fn default_amount_lots() -> Decimal {
    // 0.01 lots
    Decimal::new(1, 2)
}

fn default_cycle_interval_seconds() -> u64 {
    10
}

fn default_journal_dir() -> String {
    "data/journal".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            bot_id: default_bot_id(),
            priority: BotPriority::default(),
            instruments: default_instruments(),
            side: default_side(),
            amount_lots: default_amount_lots(),
            cycle_interval_seconds: default_cycle_interval_seconds(),
            use_trade_v3: false,
            journal_dir: default_journal_dir(),
            guards: GuardChainConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the given path, falling back to defaults when the file
    /// does not exist.
    pub fn load(config_path: &str) -> AppResult<Self> {
        if Path::new(config_path).exists() {
            Self::from_file(config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Parsed brokerage environment.
    pub fn environment(&self) -> AppResult<Environment> {
        self.environment.parse().map_err(AppError::Config)
    }
}
