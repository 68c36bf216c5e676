use crate::accountant::Portfolio;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Per-symbol holdings as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub market_value: Decimal,
}

/// A read-only snapshot of the account, derived from the portfolio and the
/// latest marks. Serving this over HTTP is someone else's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub total_balance: Decimal,
    pub available_balance: Decimal,
    pub locked_balance: Decimal,
    pub unrealized_pnl: Decimal,
    pub assets: HashMap<String, AssetSummary>,
}

impl DashboardSnapshot {
    /// Captures the current account view. Symbols without a mark value at
    /// their book price, mirroring `Portfolio::mark_to_market`.
    pub fn capture(portfolio: &Portfolio, marks: &HashMap<String, Decimal>) -> Self {
        let equity = portfolio.mark_to_market(marks);
        let cash = portfolio.cash;
        let locked = (equity - cash).max(Decimal::ZERO);

        let mut assets = HashMap::new();
        let mut unrealized = Decimal::ZERO;
        for (symbol, position) in &portfolio.positions {
            let mark = marks.get(symbol).copied().unwrap_or(position.average_price);
            unrealized += (mark - position.average_price) * position.quantity;
            assets.insert(
                symbol.clone(),
                AssetSummary {
                    quantity: position.quantity,
                    average_price: position.average_price,
                    market_value: position.market_value(mark),
                },
            );
        }

        Self {
            total_balance: equity,
            available_balance: cash,
            locked_balance: locked,
            unrealized_pnl: unrealized,
            assets,
        }
    }
}
