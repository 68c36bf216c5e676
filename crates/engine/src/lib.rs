//! # Helios Execution Loop
//!
//! The central orchestrator for a trading session. It wires the market feed,
//! the strategy runtime, the risk gate, the order router and the portfolio
//! accountant into one loop:
//!
//! tick → mark update → equity snapshot → strategy fan-out → risk gate →
//! router → portfolio mutation.
//!
//! ## Ordering and sharing
//!
//! The loop is the single consumer of the tick channel and the single writer
//! of both the mark map and the portfolio. Strategies run concurrently within
//! a tick but are joined before any order is submitted, and the portfolio is
//! never locked across a strategy or router await, so a tick's fills are
//! applied atomically and later ticks cannot overtake earlier ones.

pub mod error;

pub use error::EngineError;

use chrono::Utc;
use core_types::{OrderRecord, OrderRequest, OrderSide, OrderType, Signal, Tick};
use futures::future::join_all;
use market_data::{FeedHandle, HistoryStore, MarketFeed};
use portfolio::{DashboardSnapshot, Portfolio};
use risk::RiskGate;
use router::OrderRouter;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use strategies::Strategy;
use tokio::sync::{mpsc, Mutex};

/// One registered strategy. Each cell has its own lock so the per-tick
/// fan-out can run every strategy concurrently while `on_data` keeps
/// exclusive access to its own state.
type StrategyCell = Arc<Mutex<Box<dyn Strategy>>>;

/// The trading loop: owns the mark map and drives all collaborators.
pub struct ExecutionLoop {
    strategies: Vec<StrategyCell>,
    marks: HashMap<String, Decimal>,
    portfolio: Arc<Mutex<Portfolio>>,
    risk: RiskGate,
    router: OrderRouter,
    feed: MarketFeed,
    history: Option<Arc<dyn HistoryStore>>,
    tick_rx: Option<mpsc::Receiver<Tick>>,
    feed_handle: Option<FeedHandle>,
}

impl ExecutionLoop {
    /// Creates the loop with all of its collaborators. Nothing runs until
    /// `start` is called.
    pub fn new(
        portfolio: Arc<Mutex<Portfolio>>,
        risk: RiskGate,
        router: OrderRouter,
        feed: MarketFeed,
        history: Option<Arc<dyn HistoryStore>>,
    ) -> Self {
        Self {
            strategies: Vec::new(),
            marks: HashMap::new(),
            portfolio,
            risk,
            router,
            feed,
            history,
            tick_rx: None,
            feed_handle: None,
        }
    }

    /// Registers a strategy. Signals are collected and submitted in
    /// registration order.
    pub fn register_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(Arc::new(Mutex::new(strategy)));
    }

    /// Prepares the session: anchors the risk gate at current equity, starts
    /// every strategy in registration order, and subscribes to the feed.
    pub async fn start(&mut self, symbols: &[String]) -> Result<(), EngineError> {
        let equity = self.portfolio.lock().await.mark_to_market(&self.marks);
        self.risk.reset_day(equity);
        tracing::info!(%equity, strategies = self.strategies.len(), "Starting execution loop");

        for cell in &self.strategies {
            cell.lock().await.on_start().await;
        }

        let (rx, handle) = self.feed.start_stream(symbols)?;
        self.tick_rx = Some(rx);
        self.feed_handle = Some(handle);
        Ok(())
    }

    /// A handle that shuts down the feed from outside the loop (e.g. a
    /// Ctrl-C watcher). After stopping, `run` drains buffered ticks and
    /// returns.
    pub fn feed_handle(&self) -> Option<FeedHandle> {
        self.feed_handle.clone()
    }

    /// Consumes ticks until the feed's sequence ends.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        let mut rx = self.tick_rx.take().ok_or(EngineError::NotStarted)?;
        while let Some(tick) = rx.recv().await {
            self.process_tick(tick).await;
        }
        tracing::info!("Market stream ended; execution loop exiting");
        Ok(())
    }

    /// Shuts the session down: stops the feed (if still up) and stops every
    /// strategy in registration order. Call after `run` has drained so that
    /// in-flight submissions have completed.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.feed_handle.take() {
            handle.stop();
        }
        for cell in &self.strategies {
            cell.lock().await.on_stop().await;
        }
        tracing::info!("Execution loop stopped");
    }

    /// Handles one tick through the full pipeline. Failures of individual
    /// strategies or signals never escape this function.
    pub async fn process_tick(&mut self, tick: Tick) {
        // 1. This tick is now the mark for its symbol.
        self.marks.insert(tick.symbol.clone(), tick.price);

        // 2. Snapshot equity and open symbols under one short lock so the
        //    risk gate sees a consistent view.
        let (equity, open_symbols) = {
            let portfolio = self.portfolio.lock().await;
            (portfolio.mark_to_market(&self.marks), portfolio.open_symbols())
        };

        // 3. Fan the tick out to every strategy; a failing strategy yields no
        //    signals and hears about it via on_error, the rest proceed.
        let fan_out = self.strategies.iter().map(|cell| {
            let cell = Arc::clone(cell);
            let tick = tick.clone();
            async move {
                let mut strategy = cell.lock().await;
                match strategy.on_data(&tick).await {
                    Ok(signals) => signals,
                    Err(error) => {
                        tracing::warn!(strategy = strategy.name(), %error, "Strategy failed on tick");
                        strategy.on_error(&error).await;
                        Vec::new()
                    }
                }
            }
        });

        // 4. join_all preserves registration order; within one strategy the
        //    signal list order is kept by extend.
        let mut signals: Vec<Signal> = Vec::new();
        for batch in join_all(fan_out).await {
            signals.extend(batch);
        }

        // 5. Gate and execute in order.
        for signal in signals {
            match self
                .risk
                .validate(&signal, &self.marks, equity, &open_symbols)
            {
                Ok(()) => self.execute_signal(signal, tick.price).await,
                Err(reason) => {
                    tracing::debug!(signal_id = %signal.signal_id, symbol = %signal.symbol, %reason, "Signal rejected");
                }
            }
        }
    }

    /// Submits one approved signal and books the resulting fill.
    async fn execute_signal(&self, signal: Signal, mark_price: Decimal) {
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
                return;
            }
        };

        let notional = result.filled_quantity * result.filled_price.unwrap_or(mark_price);
        {
            // Cash and position move together under one lock: a fill is
            // booked atomically or not at all.
            let mut portfolio = self.portfolio.lock().await;
            match signal.side {
                OrderSide::Buy => {
                    portfolio.update_cash(-notional);
                    portfolio.update_position(&signal.symbol, result.filled_quantity, mark_price);
                }
                OrderSide::Sell => {
                    portfolio.update_cash(notional);
                    portfolio.update_position(&signal.symbol, -result.filled_quantity, mark_price);
                }
            }
        }
        tracing::info!(
            order_id = %result.order_id,
            symbol = %signal.symbol,
            side = %signal.side,
            quantity = %result.filled_quantity,
            %notional,
            "Executed signal"
        );

        if let Some(store) = &self.history {
            let record = OrderRecord {
                order_id: result.order_id.clone(),
                symbol: signal.symbol.clone(),
                side: signal.side,
                status: result.status,
                quantity: result.filled_quantity,
                price: result.filled_price,
                created_at: Utc::now(),
            };
            if let Err(error) = store.record_order(&record).await {
                tracing::warn!(order_id = %record.order_id, %error, "Failed to record order");
            }
        }
    }

    /// The latest marks observed by the loop.
    pub fn marks(&self) -> &HashMap<String, Decimal> {
        &self.marks
    }

    /// A read-only account snapshot for the dashboard layer.
    pub async fn dashboard(&self) -> DashboardSnapshot {
        let portfolio = self.portfolio.lock().await;
        DashboardSnapshot::capture(&portfolio, &self.marks)
    }
}
