//! Replay and valuation settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_CASH_CURRENCIES, DEFAULT_DUAL_CLASS_SUFFIX,
    DEFAULT_DUAL_CLASS_SYMBOLS, DEFAULT_JOURNAL_CURRENCY, DEFAULT_MARKET_SUFFIX,
    DEFAULT_MAX_LOOKUP_STEP_BACK_DAYS, DEFAULT_OPTION_CONTRACT_MULTIPLIER, DEFAULT_SUFFIX_CURRENCY,
};
use crate::errors::{Error, Result};
use crate::utils::time_utils::DEFAULT_VALUATION_TZ;

/// How in-kind transfer codes are turned into real tickers.
///
/// Broker export paths disagree on whether the market suffix is appended
/// before or after the transfer-code lookup, so callers choose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferSymbolRule {
    /// Append the suffix to suffix-currency codes, then look the result up.
    SuffixThenLookup,
    /// Look the raw code up, then append the suffix to suffix-currency results.
    LookupThenSuffix,
    /// Suffix-currency codes only gain the suffix; all other codes are looked up.
    LookupNonSuffixCurrencyOnly,
}

/// Where a reverse split / name change row gets its price from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReverseSplitPricing {
    /// Positive-quantity rows always re-price from the oracle. This covers
    /// the incoming leg of a name change (NAC) as well as a reverse split
    /// (REV), so a renamed holding's cost basis becomes the new ticker's
    /// close on the rename date.
    AlwaysFetch,
    /// Only rows with a zero price are backfilled from the oracle.
    FetchWhenMissing,
    /// The row price is used as-is.
    UseRowPrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_market_suffix")]
    pub market_suffix: String,
    #[serde(default = "default_suffix_currency")]
    pub suffix_currency: String,
    /// Currency a suffix-currency holding moves into when journalled.
    #[serde(default = "default_journal_currency")]
    pub journal_currency: String,
    pub transfer_symbol_rule: TransferSymbolRule,
    pub reverse_split_pricing: ReverseSplitPricing,
    #[serde(default = "default_option_contract_multiplier")]
    pub option_contract_multiplier: Decimal,
    #[serde(default = "default_dual_class_symbols")]
    pub dual_class_symbols: Vec<String>,
    #[serde(default = "default_dual_class_suffix")]
    pub dual_class_suffix: String,
    #[serde(default = "default_cash_currencies")]
    pub cash_currencies: Vec<String>,
    #[serde(default = "default_max_lookup_step_back_days")]
    pub max_lookup_step_back_days: u32,
    #[serde(default = "default_valuation_timezone")]
    pub valuation_timezone: String,
}

fn default_base_currency() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

fn default_market_suffix() -> String {
    DEFAULT_MARKET_SUFFIX.to_string()
}

fn default_suffix_currency() -> String {
    DEFAULT_SUFFIX_CURRENCY.to_string()
}

fn default_journal_currency() -> String {
    DEFAULT_JOURNAL_CURRENCY.to_string()
}

fn default_option_contract_multiplier() -> Decimal {
    Decimal::from(DEFAULT_OPTION_CONTRACT_MULTIPLIER)
}

fn default_dual_class_symbols() -> Vec<String> {
    DEFAULT_DUAL_CLASS_SYMBOLS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_dual_class_suffix() -> String {
    DEFAULT_DUAL_CLASS_SUFFIX.to_string()
}

fn default_cash_currencies() -> Vec<String> {
    DEFAULT_CASH_CURRENCIES.iter().map(|s| s.to_string()).collect()
}

fn default_max_lookup_step_back_days() -> u32 {
    DEFAULT_MAX_LOOKUP_STEP_BACK_DAYS
}

fn default_valuation_timezone() -> String {
    DEFAULT_VALUATION_TZ.name().to_string()
}

impl Settings {
    /// Settings with defaults for everything except the two policies that
    /// have no safe default.
    pub fn new(
        transfer_symbol_rule: TransferSymbolRule,
        reverse_split_pricing: ReverseSplitPricing,
    ) -> Self {
        Settings {
            base_currency: default_base_currency(),
            market_suffix: default_market_suffix(),
            suffix_currency: default_suffix_currency(),
            journal_currency: default_journal_currency(),
            transfer_symbol_rule,
            reverse_split_pricing,
            option_contract_multiplier: default_option_contract_multiplier(),
            dual_class_symbols: default_dual_class_symbols(),
            dual_class_suffix: default_dual_class_suffix(),
            cash_currencies: default_cash_currencies(),
            max_lookup_step_back_days: default_max_lookup_step_back_days(),
            valuation_timezone: default_valuation_timezone(),
        }
    }

    /// Parses and validates settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "baseCurrency must not be empty".to_string(),
            ));
        }
        if self.market_suffix.trim().is_empty() || self.suffix_currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "marketSuffix and suffixCurrency must not be empty".to_string(),
            ));
        }
        if self.journal_currency.trim().is_empty() || self.journal_currency == self.suffix_currency
        {
            return Err(Error::InvalidConfigValue(format!(
                "journalCurrency must differ from suffixCurrency '{}'",
                self.suffix_currency
            )));
        }
        if self.option_contract_multiplier <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "optionContractMultiplier must be positive, got {}",
                self.option_contract_multiplier
            )));
        }
        if self.max_lookup_step_back_days == 0 {
            return Err(Error::InvalidConfigValue(
                "maxLookupStepBackDays must be at least 1".to_string(),
            ));
        }
        if self.cash_currencies.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidConfigValue(
                "cashCurrencies must not contain empty codes".to_string(),
            ));
        }
        self.valuation_tz()?;
        Ok(())
    }

    pub fn valuation_tz(&self) -> Result<chrono_tz::Tz> {
        self.valuation_timezone.parse::<chrono_tz::Tz>().map_err(|e| {
            Error::InvalidConfigValue(format!(
                "valuationTimezone '{}' is not a known timezone: {}",
                self.valuation_timezone, e
            ))
        })
    }

    /// Currency a position in `currency` moves into when journalled.
    pub fn journal_destination_currency(&self, currency: &str) -> &str {
        if currency == self.suffix_currency {
            &self.journal_currency
        } else {
            &self.suffix_currency
        }
    }

    pub fn is_dual_class(&self, bare_symbol: &str) -> bool {
        self.dual_class_symbols.iter().any(|s| s == bare_symbol)
    }
}
