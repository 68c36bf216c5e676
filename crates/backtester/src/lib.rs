//! # Helios Backtester
//!
//! Drives the same risk, router and portfolio contracts as the live
//! execution loop, but from a finite candle series instead of a live stream.
//! Each candle becomes a synthetic tick at the candle's close, and an equity
//! sample is taken after each candle has been fully processed.

pub mod error;

pub use error::BacktestError;

use core_types::{Interval, OrderRequest, OrderSide, OrderType, Signal, Tick};
use indicatif::{ProgressBar, ProgressStyle};
use market_data::HistoricalDataService;
use portfolio::Portfolio;
use risk::RiskGate;
use router::OrderRouter;
use rust_decimal::Decimal;
use std::collections::HashMap;
use strategies::Strategy;

/// The outcome of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    /// One post-execution equity sample per candle.
    pub equity_curve: Vec<Decimal>,
    /// The signals that passed the gate and were filled, in execution order.
    pub executed_signals: Vec<Signal>,
}

impl BacktestReport {
    /// Simple return over the run, 0 when fewer than two samples exist.
    pub fn total_return(&self) -> Decimal {
        if self.equity_curve.len() < 2 {
            return Decimal::ZERO;
        }
        let first = self.equity_curve[0];
        let last = self.equity_curve[self.equity_curve.len() - 1];
        if first.is_zero() {
            return Decimal::ZERO;
        }
        (last - first) / first
    }
}

/// The offline simulation harness for one strategy.
pub struct BacktestEngine {
    history: HistoricalDataService,
    strategy: Box<dyn Strategy>,
    portfolio: Portfolio,
    risk: RiskGate,
    router: OrderRouter,
}

impl BacktestEngine {
    pub fn new(
        history: HistoricalDataService,
        strategy: Box<dyn Strategy>,
        portfolio: Portfolio,
        risk: RiskGate,
        router: OrderRouter,
    ) -> Self {
        Self {
            history,
            strategy,
            portfolio,
            risk,
            router,
        }
    }

    /// Replays `limit` candles of history through the trading pipeline.
    pub async fn run(
        &mut self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<BacktestReport, BacktestError> {
        let candles = self.history.fetch_candles(symbol, interval, limit).await?;
        tracing::info!(%symbol, %interval, candles = candles.len(), "Starting backtest");

        self.strategy.on_start().await;

        let mut marks: HashMap<String, Decimal> = HashMap::new();
        let mut equity_curve = Vec::with_capacity(candles.len());
        let mut executed_signals = Vec::new();

        // The pre-candle equity read seeds the daily-drawdown anchor only;
        // the curve itself holds one sample per candle.
        let starting_equity = self.portfolio.mark_to_market(&marks);
        self.risk.reset_day(starting_equity);

        let progress_bar = ProgressBar::new(candles.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("=>-"),
        );

        for candle in &candles {
            let tick = Tick {
                symbol: symbol.to_string(),
                price: candle.close,
                timestamp: candle.open_time,
                volume: Some(candle.volume),
            };
            marks.insert(tick.symbol.clone(), tick.price);

            let signals = match self.strategy.on_data(&tick).await {
                Ok(signals) => signals,
                Err(error) => {
                    tracing::warn!(strategy = self.strategy.name(), %error, "Strategy failed on candle");
                    self.strategy.on_error(&error).await;
                    Vec::new()
                }
            };

            let equity = self.portfolio.mark_to_market(&marks);
            let open_symbols = self.portfolio.open_symbols();
            for signal in signals {
                match self.risk.validate(&signal, &marks, equity, &open_symbols) {
                    Ok(()) => {
                        if self.execute_signal(&signal, tick.price).await {
                            executed_signals.push(signal);
                        }
                    }
                    Err(reason) => {
                        tracing::debug!(symbol = %signal.symbol, %reason, "Signal rejected");
                    }
                }
            }

            equity_curve.push(self.portfolio.mark_to_market(&marks));
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("Simulation complete");
        self.strategy.on_stop().await;

        Ok(BacktestReport {
            equity_curve,
            executed_signals,
        })
    }

    /// Submits one approved signal and books the fill; returns whether the
    /// submission produced a result to book.
    async fn execute_signal(&mut self, signal: &Signal, mark_price: Decimal) -> bool {
        let request = OrderRequest {
            symbol: signal.symbol.clone(),
            side: signal.side,
            quantity: signal.quantity,
            limit_price: Some(mark_price),
            order_type: OrderType::Market,
        };

        let result = match self.router.submit(&request).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(symbol = %signal.symbol, %error, "Order submission failed");
                return false;
            }
        };

        let notional = result.filled_quantity * result.filled_price.unwrap_or(mark_price);
        match signal.side {
            OrderSide::Buy => {
                self.portfolio.update_cash(-notional);
                self.portfolio
                    .update_position(&signal.symbol, result.filled_quantity, mark_price);
            }
            OrderSide::Sell => {
                self.portfolio.update_cash(notional);
                self.portfolio
                    .update_position(&signal.symbol, -result.filled_quantity, mark_price);
            }
        }
        true
    }

    /// The portfolio in its post-run state.
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }
}
