use anyhow::{bail, Context, Result};
use backtester::{BacktestEngine, BacktestReport};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use configuration::{init_tracing, load_config, Config};
use core_types::{Interval, StrategyId};
use engine::ExecutionLoop;
use market_data::{HistoricalDataService, HistoryStore, MarketFeed, MemoryHistoryStore};
use portfolio::Portfolio;
use risk::RiskGate;
use router::OrderRouter;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use strategies::create_strategy;
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "helios", about = "Algorithmic crypto trading engine")]
struct Cli {
    /// Path to the configuration file (without extension).
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live trading loop (paper mode unless credentials are set).
    Live {
        /// Symbols to subscribe to.
        #[arg(long, value_delimiter = ',', default_value = "BTCUSDT")]
        symbols: Vec<String>,

        /// Stop after this many seconds instead of waiting for Ctrl-C.
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Replay historical candles through a strategy.
    Backtest {
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        #[arg(long, default_value = "1h")]
        interval: String,

        #[arg(long, default_value_t = 100)]
        limit: usize,

        #[arg(long, default_value = "momentum")]
        strategy: String,
    },
}

fn parse_strategy(name: &str) -> Result<StrategyId> {
    match name {
        "momentum" => Ok(StrategyId::Momentum),
        "mean_reversion" => Ok(StrategyId::MeanReversion),
        "grid" => Ok(StrategyId::Grid),
        other => bail!("Unknown strategy: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let _guard = init_tracing(&config.logging)?;

    tracing::info!(environment = %config.settings.environment, "Helios starting");

    match cli.command {
        Commands::Live { symbols, duration } => run_live(&config, symbols, duration).await?,
        Commands::Backtest {
            symbol,
            interval,
            limit,
            strategy,
        } => run_backtest(&config, &symbol, &interval, limit, &strategy).await?,
    }

    Ok(())
}

async fn run_live(config: &Config, symbols: Vec<String>, duration: Option<u64>) -> Result<()> {
    let portfolio = Arc::new(Mutex::new(Portfolio::new(config.settings.initial_capital)));
    let risk = RiskGate::new(config.risk.clone())?;
    let router = OrderRouter::from_config(&config.exchange);
    let feed = MarketFeed::from_config(&config.exchange);
    let history: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());

    let mut engine = ExecutionLoop::new(portfolio, risk, router, feed, Some(history));

    let enabled_bots: Vec<_> = config.bots.iter().filter(|b| b.enabled).collect();
    if enabled_bots.is_empty() {
        tracing::info!("No bots configured; registering the momentum strategy");
        engine.register_strategy(create_strategy(StrategyId::Momentum, &config.strategies)?);
    } else {
        for bot in enabled_bots {
            tracing::info!(strategy = ?bot.strategy_id, "Registering strategy");
            engine.register_strategy(create_strategy(bot.strategy_id, &config.strategies)?);
        }
    }

    engine.start(&symbols).await?;
    tracing::info!(?symbols, "Live loop running; stop with Ctrl-C");

    // Shut the feed down on Ctrl-C (or after --duration); the loop drains
    // buffered ticks and in-flight orders complete before strategies stop.
    let feed_handle = engine.feed_handle();
    tokio::spawn(async move {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown signal received");
            }
        }
        if let Some(handle) = feed_handle {
            handle.stop();
        }
    });

    engine.run().await?;
    engine.stop().await;

    let snapshot = engine.dashboard().await;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Total balance"),
        Cell::new(snapshot.total_balance.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Available balance"),
        Cell::new(snapshot.available_balance.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Locked balance"),
        Cell::new(snapshot.locked_balance.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Unrealized PnL"),
        Cell::new(snapshot.unrealized_pnl.to_string()),
    ]);
    for (symbol, asset) in &snapshot.assets {
        table.add_row(vec![
            Cell::new(format!("Position {symbol}")),
            Cell::new(format!(
                "{} @ {} (value {})",
                asset.quantity, asset.average_price, asset.market_value
            )),
        ]);
    }
    println!("{table}");

    Ok(())
}

async fn run_backtest(
    config: &Config,
    symbol: &str,
    interval: &str,
    limit: usize,
    strategy_name: &str,
) -> Result<()> {
    let interval: Interval = interval
        .parse()
        .with_context(|| format!("invalid --interval {interval}"))?;
    let strategy_id = parse_strategy(strategy_name)?;

    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    let history = HistoricalDataService::new(Some(store));
    let strategy = create_strategy(strategy_id, &config.strategies)?;
    let portfolio = Portfolio::new(config.settings.initial_capital);
    let risk = RiskGate::new(config.risk.clone())?;

    let mut engine = BacktestEngine::new(
        history,
        strategy,
        portfolio,
        risk,
        OrderRouter::simulated(),
    );
    let report = engine.run(symbol, interval, limit).await?;

    print_backtest_summary(symbol, strategy_name, &report, config.settings.initial_capital);
    Ok(())
}

fn print_backtest_summary(
    symbol: &str,
    strategy_name: &str,
    report: &BacktestReport,
    initial_capital: Decimal,
) {
    let final_equity = report
        .equity_curve
        .last()
        .copied()
        .unwrap_or(initial_capital);
    let total_return_pct = report.total_return() * dec!(100);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Backtest", "Value"]);
    table.add_row(vec![Cell::new("Symbol"), Cell::new(symbol)]);
    table.add_row(vec![Cell::new("Strategy"), Cell::new(strategy_name)]);
    table.add_row(vec![
        Cell::new("Candles"),
        Cell::new(report.equity_curve.len().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Executed signals"),
        Cell::new(report.executed_signals.len().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Final equity"),
        Cell::new(final_equity.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Total return"),
        Cell::new(format!("{total_return_pct:.2}%")),
    ]);
    println!("{table}");
}
