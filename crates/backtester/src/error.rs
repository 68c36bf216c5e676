use market_data::MarketDataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}
