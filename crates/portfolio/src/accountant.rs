use core_types::Position;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Manages the state of a trading account: cash plus per-symbol positions.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
}

impl Portfolio {
    /// Creates a new `Portfolio` with a given amount of starting capital.
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            cash: starting_cash,
            positions: HashMap::new(),
        }
    }

    /// Adds a signed delta to cash. A negative delta may drive cash below
    /// zero; the caller decides whether that is acceptable.
    pub fn update_cash(&mut self, delta: Decimal) {
        self.cash += delta;
    }

    /// Applies a signed fill to the position for `symbol` and returns the new
    /// position state.
    ///
    /// Invariants maintained:
    /// - a zero quantity always carries a zero average price;
    /// - a same-direction fill moves the average price to the size-weighted
    ///   mean of the prior basis and the fill;
    /// - a smaller opposite fill reduces the quantity and leaves the basis
    ///   untouched;
    /// - a fill that flips the sign re-bases the residual at the fill price.
    ///
    /// A zero-quantity fill is a no-op.
    pub fn update_position(
        &mut self,
        symbol: &str,
        fill_quantity: Decimal,
        fill_price: Decimal,
    ) -> Position {
        let position = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol));

        if fill_quantity.is_zero() {
            return position.clone();
        }
        tracing::debug!(%symbol, %fill_quantity, %fill_price, "Applying fill");

        let prior_quantity = position.quantity;
        let new_quantity = prior_quantity + fill_quantity;

        if new_quantity.is_zero() {
            position.quantity = Decimal::ZERO;
            position.average_price = Decimal::ZERO;
        } else if prior_quantity.is_zero()
            || prior_quantity.is_sign_positive() == fill_quantity.is_sign_positive()
        {
            let prior_abs = prior_quantity.abs();
            let fill_abs = fill_quantity.abs();
            position.average_price = (position.average_price * prior_abs
                + fill_price * fill_abs)
                / (prior_abs + fill_abs);
            position.quantity = new_quantity;
        } else if new_quantity.is_sign_positive() == prior_quantity.is_sign_positive() {
            // Partial close: realized PnL goes to cash, not into the basis.
            position.quantity = new_quantity;
        } else {
            // Sign flip: the residual is a fresh position at the fill price.
            position.quantity = new_quantity;
            position.average_price = fill_price;
        }

        position.clone()
    }

    /// Returns the position for `symbol`, if one has ever been opened.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// The symbols currently held with a non-zero quantity.
    pub fn open_symbols(&self) -> HashSet<String> {
        self.positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.symbol.clone())
            .collect()
    }

    /// Total equity at the given marks: cash plus the value of every
    /// position. A symbol missing from `marks` values at its average price,
    /// so a freshly opened position marks at book value until a tick arrives.
    pub fn mark_to_market(&self, marks: &HashMap<String, Decimal>) -> Decimal {
        let mut equity = self.cash;
        for (symbol, position) in &self.positions {
            let mark = marks.get(symbol).copied().unwrap_or(position.average_price);
            equity += position.market_value(mark);
        }
        equity
    }
}
