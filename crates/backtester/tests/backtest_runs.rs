//! Backtest harness exercises against a seeded in-memory candle store.

use async_trait::async_trait;
use backtester::{BacktestEngine, BacktestReport};
use chrono::{Duration, Utc};
use configuration::RiskLimits;
use core_types::{Candle, Interval, OrderSide, Signal, Tick};
use market_data::{HistoricalDataService, HistoryStore, MemoryHistoryStore};
use portfolio::Portfolio;
use risk::RiskGate;
use router::OrderRouter;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use strategies::{Strategy, StrategyError};

/// Emits a fixed BUY on every candle after the first.
struct BuyAfterWarmup {
    running: bool,
    seen: usize,
}

#[async_trait]
impl Strategy for BuyAfterWarmup {
    fn name(&self) -> &str {
        "buy_after_warmup"
    }

    async fn on_start(&mut self) {
        self.running = true;
    }

    async fn on_stop(&mut self) {
        self.running = false;
    }

    async fn on_data(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        if !self.running {
            return Ok(Vec::new());
        }
        self.seen += 1;
        if self.seen == 1 {
            return Ok(Vec::new());
        }
        Ok(vec![Signal::new(
            tick.symbol.clone(),
            OrderSide::Buy,
            dec!(0.1),
            dec!(1),
        )])
    }
}

/// Never trades.
struct Quiet {
    running: bool,
}

#[async_trait]
impl Strategy for Quiet {
    fn name(&self) -> &str {
        "quiet"
    }

    async fn on_start(&mut self) {
        self.running = true;
    }

    async fn on_stop(&mut self) {
        self.running = false;
    }

    async fn on_data(&mut self, _tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        Ok(Vec::new())
    }
}

fn flat_candles(count: usize, close: Decimal) -> Vec<Candle> {
    let now = Utc::now();
    (0..count)
        .map(|index| Candle {
            open_time: now - Duration::minutes((count - index) as i64),
            open: close,
            high: close * dec!(1.01),
            low: close * dec!(0.99),
            close,
            volume: dec!(1000),
        })
        .collect()
}

async fn seeded_history(symbol: &str, candles: &[Candle]) -> HistoricalDataService {
    let store = Arc::new(MemoryHistoryStore::new());
    store
        .store_candles(symbol, Interval::OneMinute, candles)
        .await
        .unwrap();
    HistoricalDataService::new(Some(store as Arc<dyn HistoryStore>))
}

fn permissive_gate() -> RiskGate {
    RiskGate::new(RiskLimits {
        max_position_pct: dec!(0.5),
        max_daily_loss_pct: dec!(0.5),
        max_positions: 10,
    })
    .unwrap()
}

async fn run_backtest(strategy: Box<dyn Strategy>, candles: usize) -> BacktestReport {
    let candle_series = flat_candles(candles, dec!(100));
    let history = seeded_history("BTCUSDT", &candle_series).await;
    let mut engine = BacktestEngine::new(
        history,
        strategy,
        Portfolio::new(dec!(1000)),
        permissive_gate(),
        OrderRouter::simulated(),
    );
    engine
        .run("BTCUSDT", Interval::OneMinute, candles)
        .await
        .unwrap()
}

/// Scenario: 25 candles replayed through a quiet strategy.
/// Expected: one equity sample per candle, all equal to starting cash, and
/// a zero total return.
#[tokio::test]
async fn equity_curve_has_one_sample_per_candle() {
    let report = run_backtest(Box::new(Quiet { running: false }), 25).await;
    assert_eq!(report.equity_curve.len(), 25);
    assert!(report.equity_curve.iter().all(|e| *e == dec!(1000)));
    assert_eq!(report.total_return(), Decimal::ZERO);
}

/// Scenario: a strategy that buys 0.1 on every candle after the first, on a
/// flat series at 100 with simulated fills.
/// Expected: every post-warmup signal executes; at a flat price the equity
/// curve stays at starting equity while the position grows.
#[tokio::test]
async fn executed_signals_are_collected() {
    let candles = 10;
    let candle_series = flat_candles(candles, dec!(100));
    let history = seeded_history("BTCUSDT", &candle_series).await;
    let mut engine = BacktestEngine::new(
        history,
        Box::new(BuyAfterWarmup {
            running: false,
            seen: 0,
        }),
        Portfolio::new(dec!(1000)),
        permissive_gate(),
        OrderRouter::simulated(),
    );
    let report = engine
        .run("BTCUSDT", Interval::OneMinute, candles)
        .await
        .unwrap();

    assert_eq!(report.executed_signals.len(), candles - 1);
    let position = engine.portfolio().position("BTCUSDT").unwrap();
    assert_eq!(position.quantity, dec!(0.9));
    assert_eq!(position.average_price, dec!(100));
    // Filled at the mark on a flat series: value moved from cash to the
    // position, equity unchanged.
    assert_eq!(engine.portfolio().cash, dec!(1000) - dec!(90));
    assert_eq!(*report.equity_curve.last().unwrap(), dec!(1000));
}

/// Scenario: a single-candle run.
/// Expected: fewer than two samples means total return reports zero.
#[tokio::test]
async fn short_curves_report_zero_return() {
    let report = run_backtest(Box::new(Quiet { running: false }), 1).await;
    assert_eq!(report.equity_curve.len(), 1);
    assert_eq!(report.total_return(), Decimal::ZERO);
}

/// Scenario: the requested limit is smaller than the stored series.
/// Expected: the run covers exactly `limit` candles.
#[tokio::test]
async fn limit_caps_the_replayed_series() {
    let candle_series = flat_candles(50, dec!(100));
    let history = seeded_history("BTCUSDT", &candle_series).await;
    let mut engine = BacktestEngine::new(
        history,
        Box::new(Quiet { running: false }),
        Portfolio::new(dec!(1000)),
        permissive_gate(),
        OrderRouter::simulated(),
    );
    let report = engine
        .run("BTCUSDT", Interval::OneMinute, 20)
        .await
        .unwrap();
    assert_eq!(report.equity_curve.len(), 20);
}
