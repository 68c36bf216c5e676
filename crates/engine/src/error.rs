use market_data::MarketDataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("The execution loop has not been started")]
    NotStarted,

    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}
