use crate::constants::REPLAY_PROGRESS_INTERVAL;
use crate::errors::{CalculatorError, Result};
use crate::market_data::{
    historical_fx_with_step_back, historical_price_with_step_back, MarketDataOracleTrait,
};
use crate::portfolio::snapshot::{Ledger, LiquidationRule, OptionContract, Position};
use crate::reference::ReferenceTables;
use crate::settings::{ReverseSplitPricing, Settings};
use crate::transactions::{
    journal_destination_symbol, parse_option_description, ActivityType, OptionDescription,
    Transaction, ACTION_CASH_IN_LIEU, ACTION_JOURNAL, ACTION_NAME_CHANGE, ACTION_OPTION_ADJUSTMENT,
    ACTION_OPTION_EXPIRY, ACTION_REVERSE_SPLIT, ACTION_TAX_ON_FEES, ACTION_TRANSFER_IN,
    ACTION_TRANSFER_OUT,
};

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, error};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

type ReplayResult<T> = std::result::Result<T, CalculatorError>;

/// Replays a chronological transaction log into a [`Ledger`].
///
/// Every transaction applies exactly one state transition. Any transaction
/// that cannot be applied halts the replay; there is no partial ledger.
#[derive(Clone)]
pub struct LedgerReplayer {
    settings: Arc<Settings>,
    reference: Arc<ReferenceTables>,
    oracle: Arc<dyn MarketDataOracleTrait>,
    tz: Tz,
}

impl LedgerReplayer {
    /// Fails when the valuation timezone does not parse; trade dates are
    /// read in that timezone.
    pub fn new(
        settings: Arc<Settings>,
        reference: Arc<ReferenceTables>,
        oracle: Arc<dyn MarketDataOracleTrait>,
    ) -> Result<Self> {
        let tz = settings.valuation_tz()?;
        Ok(Self {
            settings,
            reference,
            oracle,
            tz,
        })
    }

    /// Replays `transactions` from an empty ledger. The slice must be sorted
    /// ascending by timestamp.
    pub fn replay(&self, transactions: &[Transaction]) -> Result<Ledger> {
        let mut ledger = Ledger::with_cash_currencies(&self.settings.cash_currencies);

        for (index, transaction) in transactions.iter().enumerate() {
            if index % REPLAY_PROGRESS_INTERVAL == 0 {
                debug!("Replaying transaction {} of {}", index + 1, transactions.len());
            }
            if let Some(previous) = index.checked_sub(1).map(|i| &transactions[i]) {
                if transaction.timestamp < previous.timestamp {
                    return Err(CalculatorError::UnsortedLog {
                        transaction_id: transaction.id.clone(),
                        date: transaction.timestamp,
                        previous: previous.timestamp,
                    }
                    .into());
                }
            }

            if let Err(e) = self.apply(transaction, transactions, &mut ledger) {
                error!("Replay halted at transaction {}: {}", transaction.id, e);
                return Err(e.into());
            }
        }

        debug!(
            "Replayed {} transactions into {} positions",
            transactions.len(),
            ledger.positions.len()
        );
        Ok(ledger)
    }

    /// Dispatches one transaction to its handler.
    fn apply(
        &self,
        transaction: &Transaction,
        log: &[Transaction],
        ledger: &mut Ledger,
    ) -> ReplayResult<()> {
        let activity_type = ActivityType::from_str(&transaction.activity_type)
            .map_err(|_| unclassified(transaction))?;

        match activity_type {
            ActivityType::Deposits
            | ActivityType::Dividends
            | ActivityType::FxConversion
            | ActivityType::Withdrawals
            | ActivityType::FeesAndRebates => {
                book_cash(ledger, transaction);
                Ok(())
            }
            ActivityType::Trades => self.handle_trade(transaction, ledger),
            ActivityType::Transfers => self.handle_transfer(transaction, ledger),
            ActivityType::Other => self.handle_other(transaction, log, ledger),
            ActivityType::CorporateActions => self.handle_corporate_action(transaction, ledger),
        }
    }

    // --- Activity Type Handlers ---

    /// Option trades (description starts with PUT/CALL) trade the canonical
    /// contract symbol at price times contract multiplier; equity trades use
    /// the row symbol. Both book net amount to cash.
    fn handle_trade(&self, transaction: &Transaction, ledger: &mut Ledger) -> ReplayResult<()> {
        let commission = transaction.commission.abs();

        if transaction.is_option_trade() {
            let description = self.option_description(transaction)?;
            let symbol = description.symbol();
            let contract = OptionContract::from_description(
                &description,
                self.settings.option_contract_multiplier,
            );
            if ledger.position(&symbol).is_some_and(|p| !p.is_option()) {
                return Err(CalculatorError::PositionKindMismatch {
                    symbol,
                    transaction_id: transaction.id.clone(),
                });
            }
            ledger.trade_or_open(
                &symbol,
                || Position::option(&symbol, &transaction.currency, contract),
                transaction.quantity,
                transaction.price * self.settings.option_contract_multiplier,
                commission,
                LiquidationRule::LiquidateAtZero,
            );
        } else {
            let symbol = required_symbol(transaction)?;
            ledger.trade_or_open(
                symbol,
                || Position::equity(symbol, &transaction.currency),
                transaction.quantity,
                transaction.price,
                commission,
                LiquidationRule::LiquidateAtZero,
            );
        }

        book_cash(ledger, transaction);
        Ok(())
    }

    /// In-kind transfers move positions; transfers without a symbol are cash.
    fn handle_transfer(&self, transaction: &Transaction, ledger: &mut Ledger) -> ReplayResult<()> {
        let action = transaction.action.as_str();
        if action != ACTION_TRANSFER_IN && action != ACTION_TRANSFER_OUT {
            return Err(unclassified(transaction));
        }

        let Some(symbol) = transaction.symbol_code() else {
            book_cash(ledger, transaction);
            return Ok(());
        };

        if action == ACTION_TRANSFER_IN {
            // In-kind transfers arrive at the day's market price, commission free.
            let price = self.historical_price(symbol, transaction)?;
            ledger.trade_or_open(
                symbol,
                || Position::equity(symbol, &transaction.currency),
                transaction.quantity,
                price,
                Decimal::ZERO,
                LiquidationRule::LiquidateAtZero,
            );
        } else {
            ledger
                .trade_existing(
                    symbol,
                    transaction.quantity,
                    transaction.price,
                    transaction.commission.abs(),
                    LiquidationRule::LiquidateAtZero,
                )
                .ok_or_else(|| missing_position(symbol, transaction))?;
        }
        Ok(())
    }

    fn handle_other(
        &self,
        transaction: &Transaction,
        log: &[Transaction],
        ledger: &mut Ledger,
    ) -> ReplayResult<()> {
        match transaction.action.as_str() {
            ACTION_OPTION_EXPIRY => {
                let symbol = self.option_description(transaction)?.symbol();
                ledger
                    .evict(&symbol)
                    .ok_or_else(|| missing_position(&symbol, transaction))?;
                debug!("Option {} expired", symbol);
                Ok(())
            }
            ACTION_TAX_ON_FEES => {
                book_cash(ledger, transaction);
                Ok(())
            }
            ACTION_JOURNAL => self.handle_journal(transaction, ledger),
            ACTION_OPTION_ADJUSTMENT => self.handle_option_adjustment(transaction, log, ledger),
            _ => Err(unclassified(transaction)),
        }
    }

    /// The outgoing (negative) leg renames the position into the other
    /// currency class; the incoming leg carries no new information.
    fn handle_journal(&self, transaction: &Transaction, ledger: &mut Ledger) -> ReplayResult<()> {
        if transaction.quantity >= Decimal::ZERO {
            return Ok(());
        }

        let symbol = required_symbol(transaction)?;
        let old_currency = ledger
            .position(symbol)
            .map(|p| p.currency.clone())
            .ok_or_else(|| missing_position(symbol, transaction))?;
        let new_currency = self
            .settings
            .journal_destination_currency(&old_currency)
            .to_string();
        let destination = journal_destination_symbol(symbol, &old_currency, &self.settings);
        let fx_rate = self.historical_fx(&old_currency, &new_currency, transaction)?;

        ledger.rename_position(symbol, |position| {
            position.journal(&destination, &new_currency, fx_rate)
        });
        debug!(
            "Journalled {} ({}) to {} ({}) at {}",
            symbol, old_currency, destination, new_currency, fx_rate
        );
        Ok(())
    }

    /// The negative leg describes the contract as held; its positive
    /// counterpart, on the same timestamp with the negated quantity, names the
    /// new underlying.
    fn handle_option_adjustment(
        &self,
        transaction: &Transaction,
        log: &[Transaction],
        ledger: &mut Ledger,
    ) -> ReplayResult<()> {
        if transaction.quantity >= Decimal::ZERO {
            return Ok(());
        }

        let counterpart = log
            .iter()
            .find(|t| {
                t.id != transaction.id
                    && t.action == ACTION_OPTION_ADJUSTMENT
                    && t.timestamp == transaction.timestamp
                    && t.quantity == -transaction.quantity
            })
            .ok_or_else(|| CalculatorError::UnpairedAdjustment {
                date: transaction.timestamp,
                quantity: transaction.quantity,
                transaction_id: transaction.id.clone(),
            })?;
        let new_underlying = self.option_description(counterpart)?.underlying_symbol;

        let date = self.trade_date(transaction);
        let multiplier = self.reference.split_multiplier(date, &transaction.id)?;

        let old_symbol = self.option_description(transaction)?.symbol();
        match ledger.position(&old_symbol) {
            None => return Err(missing_position(&old_symbol, transaction)),
            Some(position) if !position.is_option() => {
                return Err(CalculatorError::PositionKindMismatch {
                    symbol: old_symbol,
                    transaction_id: transaction.id.clone(),
                })
            }
            Some(_) => {}
        }

        let new_symbol = ledger.rename_position(&old_symbol, |position| {
            position.adjust_for_split(multiplier, &new_underlying);
        });
        debug!(
            "Adjusted option {} to {:?} for a {}x split",
            old_symbol, new_symbol, multiplier
        );
        Ok(())
    }

    /// Reverse splits and name changes arrive as a negative leg on the old
    /// holding and a positive leg on the new one. Neither leg liquidates.
    fn handle_corporate_action(
        &self,
        transaction: &Transaction,
        ledger: &mut Ledger,
    ) -> ReplayResult<()> {
        let action = transaction.action.as_str();
        if action == ACTION_CASH_IN_LIEU {
            book_cash(ledger, transaction);
            return Ok(());
        }
        if action != ACTION_REVERSE_SPLIT && action != ACTION_NAME_CHANGE {
            return Err(unclassified(transaction));
        }

        let symbol = required_symbol(transaction)?;
        let commission = transaction.commission.abs();

        if transaction.quantity < Decimal::ZERO {
            ledger
                .trade_existing(
                    symbol,
                    transaction.quantity,
                    transaction.price,
                    commission,
                    LiquidationRule::KeepAtZero,
                )
                .ok_or_else(|| missing_position(symbol, transaction))?;
            return Ok(());
        }

        let price = match self.settings.reverse_split_pricing {
            ReverseSplitPricing::AlwaysFetch => self.historical_price(symbol, transaction)?,
            ReverseSplitPricing::FetchWhenMissing if transaction.price.is_zero() => {
                self.historical_price(symbol, transaction)?
            }
            ReverseSplitPricing::FetchWhenMissing | ReverseSplitPricing::UseRowPrice => {
                transaction.price
            }
        };
        ledger.trade_or_open(
            symbol,
            || Position::equity(symbol, &transaction.currency),
            transaction.quantity,
            price,
            commission,
            LiquidationRule::KeepAtZero,
        );
        Ok(())
    }

    // --- Lookups ---

    fn trade_date(&self, transaction: &Transaction) -> NaiveDate {
        transaction.trade_date(self.tz)
    }

    fn option_description(&self, transaction: &Transaction) -> ReplayResult<OptionDescription> {
        parse_option_description(
            &transaction.description,
            &transaction.currency,
            &self.settings.market_suffix,
            &self.settings.suffix_currency,
        )
        .map_err(|reason| CalculatorError::InvalidOptionDescription {
            description: transaction.description.clone(),
            transaction_id: transaction.id.clone(),
            reason,
        })
    }

    fn historical_price(&self, symbol: &str, transaction: &Transaction) -> ReplayResult<Decimal> {
        historical_price_with_step_back(
            self.oracle.as_ref(),
            symbol,
            self.trade_date(transaction),
            self.settings.max_lookup_step_back_days,
        )
        .map(|point| point.value)
        .map_err(|source| CalculatorError::Oracle {
            transaction_id: transaction.id.clone(),
            source,
        })
    }

    fn historical_fx(
        &self,
        from: &str,
        to: &str,
        transaction: &Transaction,
    ) -> ReplayResult<Decimal> {
        historical_fx_with_step_back(
            self.oracle.as_ref(),
            from,
            to,
            self.trade_date(transaction),
            self.settings.max_lookup_step_back_days,
        )
        .map(|point| point.value)
        .map_err(|source| CalculatorError::Oracle {
            transaction_id: transaction.id.clone(),
            source,
        })
    }
}

/// Books the transaction's net amount in its own currency.
#[inline]
fn book_cash(ledger: &mut Ledger, transaction: &Transaction) {
    ledger.add_cash(&transaction.currency, transaction.net_amount);
}

fn required_symbol(transaction: &Transaction) -> ReplayResult<&str> {
    transaction
        .symbol_code()
        .ok_or_else(|| CalculatorError::MissingSymbol {
            activity_type: transaction.activity_type.clone(),
            action: transaction.action.clone(),
            transaction_id: transaction.id.clone(),
        })
}

fn missing_position(symbol: &str, transaction: &Transaction) -> CalculatorError {
    CalculatorError::MissingPosition {
        symbol: symbol.to_string(),
        transaction_id: transaction.id.clone(),
        date: transaction.timestamp,
    }
}

fn unclassified(transaction: &Transaction) -> CalculatorError {
    CalculatorError::UnclassifiedActivity {
        activity_type: transaction.activity_type.clone(),
        action: transaction.action.clone(),
        transaction_id: transaction.id.clone(),
        date: transaction.timestamp,
    }
}
