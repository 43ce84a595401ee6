use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transactions::{option_symbol, OptionDescription, OptionType};

/// Whether a transition that lands on exactly zero quantity removes the
/// position. Every transition names its rule explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationRule {
    /// Ordinary trades and transfers: zero quantity liquidates the position.
    LiquidateAtZero,
    /// Corporate-action legs: the position survives at zero until its
    /// counterpart leg restores the quantity.
    KeepAtZero,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub option_type: OptionType,
    pub underlying_symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    /// Shares of underlying per contract.
    pub multiplier: Decimal,
}

impl OptionContract {
    pub fn from_description(description: &OptionDescription, multiplier: Decimal) -> Self {
        OptionContract {
            option_type: description.option_type,
            underlying_symbol: description.underlying_symbol.clone(),
            expiration: description.expiration,
            strike: description.strike,
            multiplier,
        }
    }

    /// Intrinsic value per contract for an underlying spot price.
    pub fn intrinsic_value(&self, spot: Decimal) -> Decimal {
        let per_share = match self.option_type {
            OptionType::Call => spot - self.strike,
            OptionType::Put => self.strike - spot,
        };
        per_share.max(Decimal::ZERO) * self.multiplier
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum InstrumentKind {
    Equity,
    Option(OptionContract),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    /// Currency the position is quoted and costed in.
    pub currency: String,
    pub instrument: InstrumentKind,
    /// Shares for equities, contracts for options.
    pub quantity: Decimal,
    /// Average cost per unit in `currency`, commissions on buys included.
    pub average_cost: Decimal,
    /// Commission paid over the position's life, buys and sells alike.
    pub commission: Decimal,
    pub liquidated: bool,
}

impl Position {
    pub fn equity(symbol: &str, currency: &str) -> Self {
        Self::new(symbol, currency, InstrumentKind::Equity)
    }

    pub fn option(symbol: &str, currency: &str, contract: OptionContract) -> Self {
        Self::new(symbol, currency, InstrumentKind::Option(contract))
    }

    fn new(symbol: &str, currency: &str, instrument: InstrumentKind) -> Self {
        Position {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            instrument,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            commission: Decimal::ZERO,
            liquidated: false,
        }
    }

    pub fn option_contract(&self) -> Option<&OptionContract> {
        match &self.instrument {
            InstrumentKind::Option(contract) => Some(contract),
            InstrumentKind::Equity => None,
        }
    }

    pub fn is_option(&self) -> bool {
        self.option_contract().is_some()
    }

    /// Applies a signed quantity change at `price` per unit.
    ///
    /// Commission always accumulates. Average cost is recomputed only when
    /// quantity increases: `(q0*c0 + dq*p + k) / q1`. Returns true when the
    /// position crossed to exactly zero under [`LiquidationRule::LiquidateAtZero`].
    pub fn apply_trade(
        &mut self,
        quantity_delta: Decimal,
        price: Decimal,
        commission: Decimal,
        rule: LiquidationRule,
    ) -> bool {
        let new_quantity = self.quantity + quantity_delta;
        self.commission += commission;

        if quantity_delta > Decimal::ZERO {
            let total_cost =
                self.quantity * self.average_cost + quantity_delta * price + commission;
            match total_cost.checked_div(new_quantity) {
                Some(average_cost) => self.average_cost = average_cost,
                None => warn!(
                    "Buy of {} {} lands on zero quantity; average cost kept at {}",
                    quantity_delta, self.symbol, self.average_cost
                ),
            }
        }

        if new_quantity.is_zero() && rule == LiquidationRule::LiquidateAtZero {
            self.liquidated = true;
        }
        self.quantity = new_quantity;
        self.liquidated
    }

    /// Moves the position into another currency class, rescaling per-unit
    /// cost and accumulated commission by `fx_rate` (old -> new currency).
    pub fn journal(&mut self, symbol: &str, currency: &str, fx_rate: Decimal) {
        self.symbol = symbol.to_string();
        self.currency = currency.to_string();
        self.average_cost *= fx_rate;
        self.commission *= fx_rate;
    }

    /// Rewrites an option after a split of its underlying. The new symbol
    /// keeps the quoted strike; the stored strike and share count are then
    /// rescaled by `multiplier`. No-op for equities.
    pub fn adjust_for_split(&mut self, multiplier: Decimal, new_underlying_symbol: &str) -> bool {
        let InstrumentKind::Option(contract) = &mut self.instrument else {
            return false;
        };
        self.symbol = option_symbol(
            new_underlying_symbol,
            contract.expiration,
            contract.option_type,
            contract.strike,
        );
        contract.underlying_symbol = new_underlying_symbol.to_string();
        contract.strike /= multiplier;
        contract.multiplier *= multiplier;
        true
    }

    /// Folds `other` into this position, as if its quantity had been bought
    /// at its average cost.
    pub fn absorb(&mut self, other: Position) {
        let new_quantity = self.quantity + other.quantity;
        let total_cost = self.quantity * self.average_cost + other.quantity * other.average_cost;
        if let Some(average_cost) = total_cost.checked_div(new_quantity) {
            self.average_cost = average_cost;
        }
        self.quantity = new_quantity;
        self.commission += other.commission;
    }
}
