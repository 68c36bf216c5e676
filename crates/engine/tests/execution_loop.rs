//! End-to-end exercises of the execution loop with scripted strategies and
//! controllable router backends.

use async_trait::async_trait;
use chrono::Utc;
use configuration::RiskLimits;
use core_types::{OrderRequest, OrderResult, OrderSide, OrderStatus, Signal, Tick};
use engine::ExecutionLoop;
use market_data::{HistoryStore, MarketFeed, MemoryHistoryStore};
use portfolio::Portfolio;
use risk::RiskGate;
use router::{OrderRouter, RouterBackend, RouterError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use strategies::{Strategy, StrategyError};
use tokio::sync::Mutex;

/// Emits one fixed signal per tick while running.
struct ScriptedStrategy {
    name: &'static str,
    side: OrderSide,
    quantity: Decimal,
    running: bool,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl ScriptedStrategy {
    fn new(name: &'static str, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            name,
            side,
            quantity,
            running: false,
            started: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn on_start(&mut self) {
        self.running = true;
        self.started.store(true, Ordering::SeqCst);
    }

    async fn on_stop(&mut self) {
        self.running = false;
        self.stopped.store(true, Ordering::SeqCst);
    }

    async fn on_data(&mut self, tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        if !self.running {
            return Ok(Vec::new());
        }
        Ok(vec![Signal::new(
            tick.symbol.clone(),
            self.side,
            self.quantity,
            dec!(1),
        )])
    }
}

/// Always fails on_data; counts on_error deliveries.
struct FailingStrategy {
    errors_seen: Arc<AtomicUsize>,
}

#[async_trait]
impl Strategy for FailingStrategy {
    fn name(&self) -> &str {
        "failing"
    }

    async fn on_start(&mut self) {}

    async fn on_stop(&mut self) {}

    async fn on_data(&mut self, _tick: &Tick) -> Result<Vec<Signal>, StrategyError> {
        Err(StrategyError::Indicator("window exploded".to_string()))
    }

    async fn on_error(&mut self, _error: &StrategyError) {
        self.errors_seen.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fills every request at a fixed price, recording requests in arrival order.
struct FixedPriceBackend {
    fill_price: Decimal,
    seen: StdMutex<Vec<OrderRequest>>,
}

impl FixedPriceBackend {
    fn new(fill_price: Decimal) -> Arc<Self> {
        Arc::new(Self {
            fill_price,
            seen: StdMutex::new(Vec::new()),
        })
    }
}

/// Local newtype around `Arc<FixedPriceBackend>` so the `RouterBackend` impl
/// below satisfies Rust's orphan rules (both the trait and `Arc` are foreign
/// to this test crate).
struct FixedPriceBackendHandle(Arc<FixedPriceBackend>);

#[async_trait]
impl RouterBackend for FixedPriceBackendHandle {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResult, RouterError> {
        self.0.seen.lock().unwrap().push(request.clone());
        Ok(OrderResult {
            order_id: format!("fixed-{}", self.0.seen.lock().unwrap().len()),
            status: OrderStatus::Filled,
            filled_quantity: request.quantity,
            filled_price: Some(self.0.fill_price),
            raw: json!({ "test": true }),
        })
    }
}

/// Rejects every submission.
struct RejectingBackend;

#[async_trait]
impl RouterBackend for RejectingBackend {
    async fn submit(&self, _request: &OrderRequest) -> Result<OrderResult, RouterError> {
        Err(RouterError::Rejected("exchange says no".to_string()))
    }
}

fn tick(symbol: &str, price: Decimal) -> Tick {
    Tick {
        symbol: symbol.to_string(),
        price,
        timestamp: Utc::now(),
        volume: None,
    }
}

fn permissive_gate() -> RiskGate {
    RiskGate::new(RiskLimits {
        max_position_pct: dec!(0.5),
        max_daily_loss_pct: dec!(0.05),
        max_positions: 10,
    })
    .unwrap()
}

fn engine_with(
    router: OrderRouter,
    history: Option<Arc<dyn HistoryStore>>,
) -> (ExecutionLoop, Arc<Mutex<Portfolio>>) {
    let portfolio = Arc::new(Mutex::new(Portfolio::new(dec!(1000))));
    let engine = ExecutionLoop::new(
        portfolio.clone(),
        permissive_gate(),
        router,
        MarketFeed::synthetic(),
        history,
    );
    (engine, portfolio)
}

/// Scenario: portfolio of 1000, one strategy emitting BUY 1 on a tick at
/// price 100, backend filling at 101.5.
/// Expected: cash 898.5 (notional uses the fill price) while the position
/// books at the tick price: quantity 1, average 100.
#[tokio::test]
async fn fill_books_notional_at_fill_price_and_basis_at_tick_price() {
    let backend = FixedPriceBackend::new(dec!(101.5));
    let (mut engine, portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend.clone()))), None);
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "buyer",
        OrderSide::Buy,
        dec!(1),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    let portfolio = portfolio.lock().await;
    assert_eq!(portfolio.cash, dec!(898.5));
    let position = portfolio.position("BTCUSDT").unwrap();
    assert_eq!(position.quantity, dec!(1));
    assert_eq!(position.average_price, dec!(100));

    // The loop pinned the request's limit price to the tick's price.
    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen[0].limit_price, Some(dec!(100)));
}

/// Scenario: a failing strategy registered alongside a healthy one.
/// Expected: the failure is delivered to on_error, the healthy strategy's
/// signal still executes, and the loop keeps going on later ticks.
#[tokio::test]
async fn strategy_failure_is_isolated() {
    let errors_seen = Arc::new(AtomicUsize::new(0));
    let backend = FixedPriceBackend::new(dec!(100));
    let (mut engine, portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend.clone()))), None);
    engine.register_strategy(Box::new(FailingStrategy {
        errors_seen: errors_seen.clone(),
    }));
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "buyer",
        OrderSide::Buy,
        dec!(1),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    assert_eq!(errors_seen.load(Ordering::SeqCst), 2);
    assert_eq!(backend.seen.lock().unwrap().len(), 2);
    assert_eq!(
        portfolio.lock().await.position("BTCUSDT").unwrap().quantity,
        dec!(2)
    );
}

/// Scenario: a signal whose notional exceeds the per-position limit.
/// Expected: silently discarded; the portfolio never moves.
#[tokio::test]
async fn oversized_signal_is_discarded() {
    let backend = FixedPriceBackend::new(dec!(100));
    let (mut engine, portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend.clone()))), None);
    // 100 * 100 = 10000 notional vs. equity 1000 * 0.5 cap = 500.
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "whale",
        OrderSide::Buy,
        dec!(100),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    assert!(backend.seen.lock().unwrap().is_empty());
    assert_eq!(portfolio.lock().await.cash, dec!(1000));
}

/// Scenario: two emitting strategies registered in a known order.
/// Expected: their signals reach the router in registration order.
#[tokio::test]
async fn signals_submit_in_registration_order() {
    let backend = FixedPriceBackend::new(dec!(100));
    let (mut engine, _portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend.clone()))), None);
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "first",
        OrderSide::Buy,
        dec!(1),
    )));
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "second",
        OrderSide::Sell,
        dec!(2),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].side, OrderSide::Buy);
    assert_eq!(seen[0].quantity, dec!(1));
    assert_eq!(seen[1].side, OrderSide::Sell);
    assert_eq!(seen[1].quantity, dec!(2));
}

/// Scenario: the router rejects the submission outright.
/// Expected: no cash or position mutation; the loop carries on.
#[tokio::test]
async fn router_rejection_skips_booking() {
    let (mut engine, portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(RejectingBackend)), None);
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "buyer",
        OrderSide::Buy,
        dec!(1),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    let portfolio = portfolio.lock().await;
    assert_eq!(portfolio.cash, dec!(1000));
    assert!(portfolio.open_symbols().is_empty());
}

/// Scenario: an executed fill with a history store attached.
/// Expected: one order record lands in the store with the fill's id, status
/// and price.
#[tokio::test]
async fn executed_orders_are_recorded() {
    let store = Arc::new(MemoryHistoryStore::new());
    let backend = FixedPriceBackend::new(dec!(101));
    let (mut engine, _portfolio) = engine_with(
        OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend))),
        Some(store.clone() as Arc<dyn HistoryStore>),
    );
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "buyer",
        OrderSide::Buy,
        dec!(1),
    )));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    engine.process_tick(tick("BTCUSDT", dec!(100))).await;

    let orders = store.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "fixed-1");
    assert_eq!(orders[0].status, OrderStatus::Filled);
    assert_eq!(orders[0].price, Some(dec!(101)));
}

/// Scenario: equity falls more than the daily-loss limit below the anchor
/// captured at start.
/// Expected: later signals are blocked even though they are small.
#[tokio::test]
async fn daily_loss_blocks_after_drawdown() {
    let backend = FixedPriceBackend::new(dec!(100));
    let (mut engine, portfolio) =
        engine_with(OrderRouter::with_backend(Box::new(FixedPriceBackendHandle(backend.clone()))), None);
    engine.register_strategy(Box::new(ScriptedStrategy::new(
        "buyer",
        OrderSide::Buy,
        dec!(0.1),
    )));

    // Anchor at equity 1000.
    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    // Simulate an external loss beyond the 5% daily limit.
    portfolio.lock().await.update_cash(dec!(-100));

    engine.process_tick(tick("BTCUSDT", dec!(100))).await;
    assert!(backend.seen.lock().unwrap().is_empty());
}

/// Scenario: full lifecycle against the synthetic feed.
/// Expected: start flips strategies to running, stop flips them back, in
/// registration order after the stream is shut down.
#[tokio::test]
async fn lifecycle_starts_and_stops_strategies() {
    let strategy = ScriptedStrategy::new("buyer", OrderSide::Buy, dec!(1));
    let started = strategy.started.clone();
    let stopped = strategy.stopped.clone();

    let (mut engine, _portfolio) = engine_with(OrderRouter::simulated(), None);
    engine.register_strategy(Box::new(strategy));

    engine.start(&["BTCUSDT".to_string()]).await.unwrap();
    assert!(started.load(Ordering::SeqCst));
    assert!(engine.feed_handle().is_some());

    engine.stop().await;
    assert!(stopped.load(Ordering::SeqCst));
}
