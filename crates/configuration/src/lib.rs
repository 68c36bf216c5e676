//! # Helios Configuration
//!
//! Typed configuration surface for the whole workspace. Components never load
//! configuration themselves; they are handed the structs defined here by the
//! orchestrating binary.

use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    BotConfig, Config, ExchangeConfig, GridParams, LoggingConfig, MeanReversionParams,
    MomentumParams, Network, RiskLimits, Settings, Strategies, StreamType,
};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Loads the application configuration.
///
/// Resolution order: `config.toml` (optional), then `HELIOS_`-prefixed
/// environment variables, then exchange credentials from the plain
/// `BINANCE_*` variables for values the file left unset.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or("config")).required(false))
        .add_source(config::Environment::with_prefix("HELIOS").separator("__"))
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;
    config.exchange.apply_env()?;

    // use_testnet is the coarse switch: turning it off promotes the default
    // testnet selection to mainnet.
    if !config.settings.use_testnet && config.exchange.network == settings::Network::Testnet {
        config.exchange.network = settings::Network::Mainnet;
    }

    Ok(config)
}

/// Installs the global tracing subscriber described by `LoggingConfig`.
///
/// Returns the appender guard when file logging is enabled; the caller must
/// keep it alive for the lifetime of the process or buffered log lines are
/// dropped on exit.
pub fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    if logging.file_logging {
        let appender = tracing_appender::rolling::daily(&logging.directory, "helios.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        Ok(None)
    }
}
