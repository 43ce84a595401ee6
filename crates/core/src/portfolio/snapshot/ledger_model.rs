//! Cash balances and open positions at one point in a replay.

use std::collections::BTreeMap;

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::positions_model::{LiquidationRule, Position};

/// Mutable replay state. Positions are keyed by symbol and only change
/// through the transition methods below.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub cash: BTreeMap<String, Decimal>,
    pub positions: BTreeMap<String, Position>,
}

impl Ledger {
    /// An empty ledger with a zero balance in each of `currencies`.
    pub fn with_cash_currencies(currencies: &[String]) -> Self {
        Ledger {
            cash: currencies
                .iter()
                .map(|currency| (currency.clone(), Decimal::ZERO))
                .collect(),
            positions: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn add_cash(&mut self, currency: &str, delta: Decimal) {
        *self
            .cash
            .entry(currency.to_string())
            .or_insert(Decimal::ZERO) += delta;
    }

    pub fn cash_balance(&self, currency: &str) -> Decimal {
        self.cash.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    /// Applies a trade to `symbol`, opening the position with `open` first if
    /// it is not held. Returns true if the trade liquidated the position.
    pub fn trade_or_open<F>(
        &mut self,
        symbol: &str,
        open: F,
        quantity_delta: Decimal,
        price: Decimal,
        commission: Decimal,
        rule: LiquidationRule,
    ) -> bool
    where
        F: FnOnce() -> Position,
    {
        let liquidated = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(open)
            .apply_trade(quantity_delta, price, commission, rule);
        self.settle(symbol, liquidated);
        liquidated
    }

    /// Applies a trade to a held position. Returns `None` if `symbol` is not held.
    pub fn trade_existing(
        &mut self,
        symbol: &str,
        quantity_delta: Decimal,
        price: Decimal,
        commission: Decimal,
        rule: LiquidationRule,
    ) -> Option<bool> {
        let liquidated = self
            .positions
            .get_mut(symbol)?
            .apply_trade(quantity_delta, price, commission, rule);
        self.settle(symbol, liquidated);
        Some(liquidated)
    }

    fn settle(&mut self, symbol: &str, liquidated: bool) {
        if liquidated {
            self.positions.remove(symbol);
            debug!("Position {} liquidated", symbol);
        }
    }

    /// Removes `from`, lets `transform` rewrite it (including its symbol) and
    /// stores it under the new symbol in one step. If the new symbol is
    /// already held, the two positions are merged.
    ///
    /// Returns the new symbol, or `None` if `from` was not held.
    pub fn rename_position<F>(&mut self, from: &str, transform: F) -> Option<String>
    where
        F: FnOnce(&mut Position),
    {
        let mut position = self.positions.remove(from)?;
        transform(&mut position);
        let to = position.symbol.clone();

        match self.positions.get_mut(&to) {
            Some(existing) => {
                warn!(
                    "Renaming {} onto held position {}; merging quantities",
                    from, to
                );
                existing.absorb(position);
            }
            None => {
                self.positions.insert(to.clone(), position);
            }
        }
        Some(to)
    }

    /// Drops a position with no cash effect.
    pub fn evict(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::with_cash_currencies(&["CAD".to_string(), "USD".to_string()])
    }

    #[test]
    fn test_seeded_cash_currencies() {
        let ledger = ledger();
        assert_eq!(ledger.cash.len(), 2);
        assert_eq!(ledger.cash_balance("CAD"), Decimal::ZERO);
        assert_eq!(ledger.cash_balance("EUR"), Decimal::ZERO);
    }

    #[test]
    fn test_trade_or_open_then_liquidate() {
        let mut ledger = ledger();
        ledger.trade_or_open(
            "SPY",
            || Position::equity("SPY", "USD"),
            dec!(10),
            dec!(250),
            dec!(1),
            LiquidationRule::LiquidateAtZero,
        );
        assert!(ledger.contains("SPY"));

        let liquidated = ledger.trade_existing(
            "SPY",
            dec!(-10),
            dec!(260),
            dec!(1),
            LiquidationRule::LiquidateAtZero,
        );
        assert_eq!(liquidated, Some(true));
        assert!(!ledger.contains("SPY"));
        assert_eq!(
            ledger.trade_existing("SPY", dec!(-1), dec!(1), dec!(0), LiquidationRule::LiquidateAtZero),
            None
        );
    }

    #[test]
    fn test_rename_is_single_step() {
        let mut ledger = ledger();
        ledger.trade_or_open(
            "DLR.TO",
            || Position::equity("DLR.TO", "CAD"),
            dec!(100),
            dec!(12.5),
            dec!(0),
            LiquidationRule::LiquidateAtZero,
        );

        let renamed = ledger.rename_position("DLR.TO", |p| p.journal("DLR-U.TO", "USD", dec!(0.8)));

        assert_eq!(renamed.as_deref(), Some("DLR-U.TO"));
        assert!(!ledger.contains("DLR.TO"));
        assert_eq!(ledger.position("DLR-U.TO").unwrap().average_cost, dec!(10));
        assert!(ledger.rename_position("MISSING", |_| {}).is_none());
    }

    #[test]
    fn test_rename_onto_held_symbol_merges() {
        let mut ledger = ledger();
        for (symbol, price) in [("DLR.TO", dec!(10)), ("DLR-U.TO", dec!(8))] {
            ledger.trade_or_open(
                symbol,
                || Position::equity(symbol, "USD"),
                dec!(10),
                price,
                dec!(0),
                LiquidationRule::LiquidateAtZero,
            );
        }

        ledger.rename_position("DLR.TO", |p| p.symbol = "DLR-U.TO".to_string());

        let merged = ledger.position("DLR-U.TO").unwrap();
        assert_eq!(merged.quantity, dec!(20));
        assert_eq!(merged.average_cost, dec!(9));
        assert_eq!(ledger.positions.len(), 1);
    }
}
