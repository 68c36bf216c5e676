use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::*;
use std::collections::HashMap;

/// Per-symbol drifting price state shared by the synthetic feed and candle
/// synthesis. Each symbol starts somewhere plausible and takes bounded
/// steps, so a series never runs away within a session.
pub struct SyntheticWalk {
    symbols: Vec<String>,
    prices: HashMap<String, f64>,
    rng: StdRng,
}

impl SyntheticWalk {
    pub fn new(symbols: &[String]) -> Self {
        let symbols: Vec<String> = if symbols.is_empty() {
            vec!["BTCUSDT".to_string()]
        } else {
            symbols.to_vec()
        };
        let mut rng = StdRng::from_entropy();
        let prices = symbols
            .iter()
            .map(|s| (s.clone(), rng.gen_range(10_000.0..60_000.0)))
            .collect();
        Self {
            symbols,
            prices,
            rng,
        }
    }

    /// Picks one of the tracked symbols at random.
    pub fn pick(&mut self) -> String {
        let index = self.rng.gen_range(0..self.symbols.len());
        self.symbols[index].clone()
    }

    /// Advances the symbol's price by one bounded step and returns it.
    pub fn step(&mut self, symbol: &str) -> Decimal {
        let change = self.rng.gen_range(-0.5..0.5);
        let price = self
            .prices
            .entry(symbol.to_string())
            .or_insert_with(|| 10_000.0 + change);
        *price += change;
        Decimal::from_f64(*price)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario: repeated steps on one symbol.
    /// Expected: prices stay positive and move by at most the step bound.
    #[test]
    fn steps_are_bounded() {
        let symbols = vec!["BTCUSDT".to_string()];
        let mut walk = SyntheticWalk::new(&symbols);
        let mut previous = walk.step("BTCUSDT");
        for _ in 0..100 {
            let next = walk.step("BTCUSDT");
            let move_size = (next - previous).abs();
            assert!(move_size <= Decimal::ONE);
            assert!(next > Decimal::ZERO);
            previous = next;
        }
    }

    /// Scenario: a walk constructed with no symbols.
    /// Expected: it tracks a default symbol rather than panicking.
    #[test]
    fn empty_symbol_list_gets_default() {
        let mut walk = SyntheticWalk::new(&[]);
        assert_eq!(walk.pick(), "BTCUSDT");
    }
}
