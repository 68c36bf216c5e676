use crate::error::MarketDataError;
use crate::synthetic::SyntheticWalk;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use core_types::{Candle, Interval, OrderRecord};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The persistence contract the core consumes: candle retrieval for
/// backtests plus post-fill order recording. Schema and storage engine are
/// someone else's concern.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;

    async fn store_candles(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[Candle],
    ) -> Result<(), MarketDataError>;

    async fn record_order(&self, record: &OrderRecord) -> Result<(), MarketDataError>;
}

/// An in-memory `HistoryStore` for tests and simulated sessions.
#[derive(Default)]
pub struct MemoryHistoryStore {
    candles: RwLock<HashMap<(String, Interval), Vec<Candle>>>,
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The orders recorded so far, oldest first.
    pub async fn orders(&self) -> Vec<OrderRecord> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let candles = self.candles.read().await;
        let series = candles
            .get(&(symbol.to_string(), interval))
            .cloned()
            .unwrap_or_default();
        let start = series.len().saturating_sub(limit);
        Ok(series[start..].to_vec())
    }

    async fn store_candles(
        &self,
        symbol: &str,
        interval: Interval,
        new_candles: &[Candle],
    ) -> Result<(), MarketDataError> {
        let mut candles = self.candles.write().await;
        let series = candles
            .entry((symbol.to_string(), interval))
            .or_default();
        series.extend_from_slice(new_candles);
        series.sort_by_key(|c| c.open_time);
        Ok(())
    }

    async fn record_order(&self, record: &OrderRecord) -> Result<(), MarketDataError> {
        self.orders.write().await.push(record.clone());
        Ok(())
    }
}

/// Serves finite candle series for backtesting.
///
/// When a store is attached and holds data for the requested series, that
/// data wins. Otherwise the service synthesizes a series with the same
/// bounded walk as the live fallback feed, and stores it back (if it can) so
/// repeated requests see a stable history.
pub struct HistoricalDataService {
    store: Option<Arc<dyn HistoryStore>>,
}

impl HistoricalDataService {
    pub fn new(store: Option<Arc<dyn HistoryStore>>) -> Self {
        Self { store }
    }

    pub async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if let Some(store) = &self.store {
            let stored = store.fetch_candles(symbol, interval, limit).await?;
            if !stored.is_empty() {
                return Ok(stored);
            }
        }

        let candles = synthesize_candles(symbol, interval, limit);
        if let Some(store) = &self.store {
            store.store_candles(symbol, interval, &candles).await?;
        }
        Ok(candles)
    }
}

/// Builds a chronological OHLCV series from the bounded walk.
fn synthesize_candles(symbol: &str, interval: Interval, limit: usize) -> Vec<Candle> {
    let symbols = vec![symbol.to_string()];
    let mut walk = SyntheticWalk::new(&symbols);
    let step = ChronoDuration::from_std(interval.duration()).unwrap_or(ChronoDuration::minutes(1));
    let now = Utc::now();

    let mut candles = Vec::with_capacity(limit);
    let mut open = walk.step(symbol);
    for index in 0..limit {
        let close = walk.step(symbol);
        let high = open.max(close) * dec!(1.01);
        let low = open.min(close) * dec!(0.99);
        candles.push(Candle {
            open_time: now - step * ((limit - index) as i32),
            open,
            high,
            low,
            close,
            volume: dec!(1000),
        });
        open = close;
    }
    candles
}
