use crate::error::ConfigError;
use core_types::StrategyId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::fmt;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub exchange: ExchangeConfig,
    pub risk: RiskLimits,
    pub strategies: Strategies,
    pub logging: LoggingConfig,
    /// The strategies to register when running live, in registration order.
    pub bots: Vec<BotConfig>,
}

/// Application-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environment: String,
    /// Route all exchange traffic to the testnet unless explicitly disabled.
    pub use_testnet: bool,
    /// Pass-through for performance reporting; the core never reads it.
    pub risk_free_rate: Decimal,
    pub initial_capital: Decimal,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            use_testnet: true,
            risk_free_rate: dec!(0.02),
            initial_capital: dec!(10000),
        }
    }
}

/// Which exchange network the gateway and stream connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl TryFrom<String> for Network {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(ConfigError::validation(format!(
                "Unsupported network: {other}"
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// Which ticker stream variant the market feed subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StreamType {
    MiniTicker,
    Ticker,
}

impl StreamType {
    /// The `@<type>` suffix of a multiplexed stream name.
    pub fn stream_suffix(&self) -> &'static str {
        match self {
            StreamType::MiniTicker => "miniTicker",
            StreamType::Ticker => "ticker",
        }
    }
}

impl TryFrom<String> for StreamType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "mini_ticker" => Ok(StreamType::MiniTicker),
            "ticker" => Ok(StreamType::Ticker),
            other => Err(ConfigError::validation(format!(
                "Unsupported stream type: {other}"
            ))),
        }
    }
}

/// Normalized representation of the exchange API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_key: String,
    pub api_secret: String,
    pub network: Network,
    pub recv_window: u64,
    pub request_timeout_secs: u64,
    pub stream_type: StreamType,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            network: Network::Testnet,
            recv_window: 5_000,
            request_timeout_secs: 10,
            stream_type: StreamType::MiniTicker,
        }
    }
}

impl ExchangeConfig {
    /// Whether credentials are present. Without them the system runs with the
    /// synthetic market feed and the simulated order backend.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// The REST base URL for the configured network.
    pub fn rest_url(&self) -> &'static str {
        match self.network {
            Network::Mainnet => "https://api.binance.com",
            Network::Testnet => "https://testnet.binance.vision",
        }
    }

    /// The WebSocket base URL for the configured network.
    pub fn ws_url(&self) -> &'static str {
        match self.network {
            Network::Mainnet => "wss://stream.binance.com:9443",
            Network::Testnet => "wss://testnet.binance.vision",
        }
    }

    /// Overlays credentials and tuning knobs from the process environment.
    ///
    /// File-provided values win; the environment only fills what is unset.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            if let Ok(key) = env::var("BINANCE_API_KEY") {
                self.api_key = key;
            }
        }
        if self.api_secret.is_empty() {
            if let Ok(secret) = env::var("BINANCE_API_SECRET") {
                self.api_secret = secret;
            }
        }
        if let Ok(window) = env::var("BINANCE_RECV_WINDOW") {
            self.recv_window = window
                .parse()
                .map_err(|_| ConfigError::validation(format!("Invalid recv window: {window}")))?;
        }
        if let Ok(timeout) = env::var("BINANCE_API_TIMEOUT") {
            self.request_timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::validation(format!("Invalid request timeout: {timeout}")))?;
        }
        if let Ok(stream_type) = env::var("BINANCE_STREAM_TYPE") {
            self.stream_type = StreamType::try_from(stream_type)?;
        }
        Ok(())
    }
}

/// Portfolio-wide limits enforced by the risk gate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// The fraction of equity a single new notional may occupy.
    pub max_position_pct: Decimal,
    /// The drawdown below the day-anchor equity at which signals are blocked.
    pub max_daily_loss_pct: Decimal,
    /// The cap on concurrent symbols with a non-zero position.
    pub max_positions: usize,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: dec!(0.05),
            max_daily_loss_pct: dec!(0.02),
            max_positions: 10,
        }
    }
}

/// Contains the parameter sets for all available strategies.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Strategies {
    pub momentum: MomentumParams,
    pub mean_reversion: MeanReversionParams,
    pub grid: GridParams,
}

/// Parameters for the sliding-window momentum strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub window: usize,
    /// The fractional deadband around the window mean.
    pub threshold: Decimal,
    pub quantity: Decimal,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: dec!(0.002),
            quantity: dec!(1),
        }
    }
}

/// Parameters for the mean-reversion strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeanReversionParams {
    pub window: usize,
    pub z_threshold: Decimal,
    pub quantity: Decimal,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            window: 20,
            z_threshold: dec!(1.5),
            quantity: dec!(1),
        }
    }
}

/// Parameters for the grid strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub levels: usize,
    /// Fractional distance between adjacent grid levels.
    pub spacing: Decimal,
    pub quantity: Decimal,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            levels: 5,
            spacing: dec!(0.01),
            quantity: dec!(1),
        }
    }
}

/// One strategy registration for the live engine.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub strategy_id: StrategyId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Controls the tracing subscriber installed at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_logging: bool,
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            directory: "logs".to_string(),
        }
    }
}
