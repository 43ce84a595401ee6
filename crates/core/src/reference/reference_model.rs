use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{CalculatorError, NormalizationError};

pub const SYMBOL_INFO_TABLE: &str = "symbol info";
pub const TRANSFER_SYMBOL_TABLE: &str = "transfer symbol";
pub const CORPORATE_ACTION_TABLE: &str = "corporate action symbol";
pub const SPLIT_MULTIPLIER_TABLE: &str = "split multiplier";

/// Classification row for one tradable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Instrument label, e.g. `ETF` or `Stock`.
    pub instrument: String,
    pub asset_class: String,
    pub region: Option<String>,
    /// Identifier the latest-price source quotes this symbol under, when it
    /// differs from the symbol itself.
    pub quote_venue_id: Option<String>,
}

impl SymbolInfo {
    pub fn new(instrument: &str, asset_class: &str, region: Option<&str>) -> Self {
        SymbolInfo {
            instrument: instrument.to_string(),
            asset_class: asset_class.to_string(),
            region: region.map(str::to_string),
            quote_venue_id: None,
        }
    }

    pub fn with_quote_venue_id(mut self, id: &str) -> Self {
        self.quote_venue_id = Some(id.to_string());
        self
    }
}

/// All reference data the engine consults. Required lookups fail with a
/// typed error; optional lookups log and return `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTables {
    #[serde(default)]
    pub symbol_info: HashMap<String, SymbolInfo>,
    /// Broker transfer code -> real ticker.
    #[serde(default)]
    pub transfer_symbols: HashMap<String, String>,
    /// Broker corporate-action code -> real ticker. Falls back to
    /// `transfer_symbols` when absent.
    #[serde(default)]
    pub corporate_action_symbols: Option<HashMap<String, String>>,
    #[serde(default)]
    pub split_multipliers: BTreeMap<NaiveDate, Decimal>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol_info(mut self, symbol: &str, info: SymbolInfo) -> Self {
        self.symbol_info.insert(symbol.to_string(), info);
        self
    }

    pub fn with_transfer_symbol(mut self, code: &str, symbol: &str) -> Self {
        self.transfer_symbols
            .insert(code.to_string(), symbol.to_string());
        self
    }

    pub fn with_corporate_action_symbol(mut self, code: &str, symbol: &str) -> Self {
        self.corporate_action_symbols
            .get_or_insert_with(HashMap::new)
            .insert(code.to_string(), symbol.to_string());
        self
    }

    pub fn with_split_multiplier(mut self, date: NaiveDate, multiplier: Decimal) -> Self {
        self.split_multipliers.insert(date, multiplier);
        self
    }

    pub fn transfer_symbol(
        &self,
        code: &str,
        transaction_id: &str,
    ) -> Result<String, NormalizationError> {
        lookup_required(
            TRANSFER_SYMBOL_TABLE,
            &self.transfer_symbols,
            code,
            transaction_id,
        )
    }

    pub fn corporate_action_symbol(
        &self,
        code: &str,
        transaction_id: &str,
    ) -> Result<String, NormalizationError> {
        match &self.corporate_action_symbols {
            Some(table) => lookup_required(CORPORATE_ACTION_TABLE, table, code, transaction_id),
            None => self.transfer_symbol(code, transaction_id),
        }
    }

    pub fn split_multiplier(
        &self,
        date: NaiveDate,
        transaction_id: &str,
    ) -> Result<Decimal, CalculatorError> {
        self.split_multipliers
            .get(&date)
            .copied()
            .ok_or_else(|| CalculatorError::SplitMultiplierMissing {
                date,
                transaction_id: transaction_id.to_string(),
            })
    }

    /// Classification is cosmetic: a miss is logged and reported as `None`.
    pub fn symbol_info(&self, symbol: &str) -> Option<&SymbolInfo> {
        lookup_optional(SYMBOL_INFO_TABLE, &self.symbol_info, symbol)
    }
}

fn lookup_required(
    table: &str,
    map: &HashMap<String, String>,
    key: &str,
    transaction_id: &str,
) -> Result<String, NormalizationError> {
    map.get(key)
        .cloned()
        .ok_or_else(|| NormalizationError::LookupMiss {
            table: table.to_string(),
            key: key.to_string(),
            transaction_id: transaction_id.to_string(),
        })
}

fn lookup_optional<'a, V>(table: &str, map: &'a HashMap<String, V>, key: &str) -> Option<&'a V> {
    let found = map.get(key);
    if found.is_none() {
        warn!("No row for '{}' in {} table, continuing without it", key, table);
    }
    found
}
