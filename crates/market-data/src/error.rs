use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("WebSocket connection error: {0}")]
    Connection(String),

    #[error("Failed to parse stream message: {0}")]
    Parse(String),

    #[error("History store error: {0}")]
    Store(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
