//! Cleans raw export rows into the chronological transaction log the
//! replayer consumes.
//!
//! Normalization is all-or-nothing: the first lookup miss fails the batch.

use std::sync::Arc;

use log::{debug, error};

use super::export_parser::parse_raw_transaction;
use super::transactions_constants::*;
use super::transactions_model::{RawTransaction, Transaction};
use crate::errors::{NormalizationError, Result};
use crate::reference::ReferenceTables;
use crate::settings::{Settings, TransferSymbolRule};

pub struct TransactionNormalizer {
    settings: Arc<Settings>,
    reference: Arc<ReferenceTables>,
}

#[derive(Debug, Default)]
struct RewriteCounts {
    suffixed: usize,
    transfers: usize,
    corporate_actions: usize,
    journals: usize,
}

impl TransactionNormalizer {
    pub fn new(settings: Arc<Settings>, reference: Arc<ReferenceTables>) -> Self {
        Self {
            settings,
            reference,
        }
    }

    /// Types, rewrites and sorts raw export rows. Row `n` (1-based) gets the
    /// identifier `row-n`.
    pub fn normalize(&self, rows: &[RawTransaction]) -> Result<Vec<Transaction>> {
        let tz = self.settings.valuation_tz()?;
        let transactions = rows
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_raw_transaction(raw, index + 1, tz))
            .collect::<Result<Vec<_>>>()?;
        self.normalize_transactions(transactions)
    }

    /// Rewrites symbols of already-typed transactions and sorts them
    /// ascending by timestamp. Same-timestamp rows keep their input order.
    pub fn normalize_transactions(
        &self,
        mut transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>> {
        let mut counts = RewriteCounts::default();
        for transaction in transactions.iter_mut() {
            match self.resolve_symbol(transaction, &mut counts) {
                Ok(symbol) => transaction.symbol = symbol,
                Err(e) => {
                    error!("Normalization failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        debug!(
            "Normalized {} rows: {} suffixed, {} in-kind transfers, {} corporate actions, {} journals",
            transactions.len(),
            counts.suffixed,
            counts.transfers,
            counts.corporate_actions,
            counts.journals
        );

        transactions.sort_by_key(|t| t.timestamp);
        Ok(transactions)
    }

    fn resolve_symbol(
        &self,
        transaction: &Transaction,
        counts: &mut RewriteCounts,
    ) -> std::result::Result<Option<String>, NormalizationError> {
        let action = transaction.action.as_str();
        let symbol = match transaction.symbol_code() {
            Some(symbol) => symbol,
            None if action == ACTION_JOURNAL || SYMBOL_REWRITE_ACTIONS.contains(&action) => {
                return Err(NormalizationError::MissingSymbol {
                    action: action.to_string(),
                    transaction_id: transaction.id.clone(),
                });
            }
            None => return Ok(None),
        };

        if transaction.activity_type == ACTIVITY_TYPE_TRANSFERS {
            counts.transfers += 1;
            return self
                .transfer_symbol(symbol, &transaction.currency, &transaction.id)
                .map(Some);
        }

        if SYMBOL_REWRITE_ACTIONS.contains(&action) {
            counts.corporate_actions += 1;
            return self
                .reference
                .corporate_action_symbol(symbol, &transaction.id)
                .map(Some);
        }

        if action == ACTION_JOURNAL {
            counts.journals += 1;
            return Ok(Some(self.journal_source_symbol(symbol, &transaction.currency)));
        }

        let suffixed = self.with_market_suffix(symbol, &transaction.currency);
        if suffixed != symbol {
            counts.suffixed += 1;
        }
        Ok(Some(suffixed))
    }

    /// Resolves an in-kind transfer code into a real ticker per the
    /// configured rule.
    fn transfer_symbol(
        &self,
        code: &str,
        currency: &str,
        transaction_id: &str,
    ) -> std::result::Result<String, NormalizationError> {
        match self.settings.transfer_symbol_rule {
            TransferSymbolRule::SuffixThenLookup => {
                let suffixed = self.with_market_suffix(code, currency);
                self.reference.transfer_symbol(&suffixed, transaction_id)
            }
            TransferSymbolRule::LookupThenSuffix => {
                let resolved = self.reference.transfer_symbol(code, transaction_id)?;
                Ok(self.with_market_suffix(&resolved, currency))
            }
            TransferSymbolRule::LookupNonSuffixCurrencyOnly => {
                if currency == self.settings.suffix_currency {
                    Ok(self.with_market_suffix(code, currency))
                } else {
                    self.reference.transfer_symbol(code, transaction_id)
                }
            }
        }
    }

    /// Appends the market suffix to suffix-currency symbols that lack it.
    fn with_market_suffix(&self, symbol: &str, currency: &str) -> String {
        if currency == self.settings.suffix_currency && !symbol.contains(&self.settings.market_suffix)
        {
            format!("{}{}", symbol, self.settings.market_suffix)
        } else {
            symbol.to_string()
        }
    }

    /// The listed symbol a journalling row refers to in its own currency.
    /// Dual-class funds list both classes on the suffixed market.
    fn journal_source_symbol(&self, symbol: &str, currency: &str) -> String {
        let settings = &self.settings;
        let base = bare_symbol(symbol, settings);
        if settings.is_dual_class(&base) {
            if currency == settings.suffix_currency {
                format!("{}{}", base, settings.market_suffix)
            } else {
                format!("{}{}{}", base, settings.dual_class_suffix, settings.market_suffix)
            }
        } else {
            self.with_market_suffix(symbol, currency)
        }
    }
}

/// Symbol with the market suffix and the dual-class suffix removed.
fn bare_symbol(symbol: &str, settings: &Settings) -> String {
    let unsuffixed = symbol.replace(&settings.market_suffix, "");
    unsuffixed
        .strip_suffix(&settings.dual_class_suffix)
        .unwrap_or(&unsuffixed)
        .to_string()
}

/// Symbol a position journalled out of `old_currency` is held under
/// afterwards.
///
/// Dual-class funds swap between `<SYM>.TO` and `<SYM>-U.TO`. Other
/// symbols lose the market suffix when leaving the suffix currency and
/// gain it when entering.
pub fn journal_destination_symbol(symbol: &str, old_currency: &str, settings: &Settings) -> String {
    let base = bare_symbol(symbol, settings);
    let leaving_suffix_currency = old_currency == settings.suffix_currency;
    if settings.is_dual_class(&base) {
        if leaving_suffix_currency {
            format!("{}{}{}", base, settings.dual_class_suffix, settings.market_suffix)
        } else {
            format!("{}{}", base, settings.market_suffix)
        }
    } else {
        let unsuffixed = symbol.replace(&settings.market_suffix, "");
        if leaving_suffix_currency {
            unsuffixed
        } else {
            format!("{}{}", unsuffixed, settings.market_suffix)
        }
    }
}
