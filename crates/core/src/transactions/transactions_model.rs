//! Raw export rows and normalized transactions.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transactions_constants::*;
use crate::utils::time_utils::valuation_date_from_utc;

/// One row of a brokerage export, exactly as read. Every field is text;
/// typing happens in [`super::export_parser`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "Transaction Date")]
    pub transaction_date: String,
    #[serde(rename = "Settlement Date", default)]
    pub settlement_date: String,
    #[serde(rename = "Action", default)]
    pub action: String,
    #[serde(rename = "Symbol", default)]
    pub symbol: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Quantity", default)]
    pub quantity: String,
    #[serde(rename = "Price", default)]
    pub price: String,
    #[serde(rename = "Gross Amount", default)]
    pub gross_amount: String,
    #[serde(rename = "Commission", default)]
    pub commission: String,
    #[serde(rename = "Net Amount", default)]
    pub net_amount: String,
    #[serde(rename = "Currency", default)]
    pub currency: String,
    #[serde(rename = "Activity Type", default)]
    pub activity_type: String,
}

/// A typed, normalized transaction. Immutable once normalization returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Stable identifier, `row-<n>` for the n-th export row.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub settlement_date: Option<DateTime<Utc>>,
    pub activity_type: String,
    pub action: String,
    pub symbol: Option<String>,
    pub description: String,
    /// Signed: positive adds to the position, negative removes.
    pub quantity: Decimal,
    pub price: Decimal,
    pub gross_amount: Decimal,
    pub commission: Decimal,
    /// Signed cash effect in `currency`.
    pub net_amount: Decimal,
    pub currency: String,
}

impl Transaction {
    /// Trading date of the transaction in the account's valuation timezone.
    pub fn trade_date(&self, tz: Tz) -> NaiveDate {
        valuation_date_from_utc(self.timestamp, tz)
    }

    /// The row's symbol, treating an empty one as absent.
    pub fn symbol_code(&self) -> Option<&str> {
        self.symbol.as_deref().filter(|s| !s.is_empty())
    }

    /// True when the description starts with `PUT` or `CALL`.
    pub fn is_option_trade(&self) -> bool {
        self.description
            .split_whitespace()
            .next()
            .is_some_and(|first| OPTION_DESCRIPTION_PREFIXES.contains(&first))
    }

    pub fn is_external_flow(&self) -> bool {
        EXTERNAL_FLOW_ACTIVITY_TYPES.contains(&self.activity_type.as_str())
    }
}

/// Activity categories the replayer knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Deposits,
    Dividends,
    FxConversion,
    Withdrawals,
    Trades,
    Transfers,
    Other,
    FeesAndRebates,
    CorporateActions,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Deposits => ACTIVITY_TYPE_DEPOSITS,
            ActivityType::Dividends => ACTIVITY_TYPE_DIVIDENDS,
            ActivityType::FxConversion => ACTIVITY_TYPE_FX_CONVERSION,
            ActivityType::Withdrawals => ACTIVITY_TYPE_WITHDRAWALS,
            ActivityType::Trades => ACTIVITY_TYPE_TRADES,
            ActivityType::Transfers => ACTIVITY_TYPE_TRANSFERS,
            ActivityType::Other => ACTIVITY_TYPE_OTHER,
            ActivityType::FeesAndRebates => ACTIVITY_TYPE_FEES_AND_REBATES,
            ActivityType::CorporateActions => ACTIVITY_TYPE_CORPORATE_ACTIONS,
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == ACTIVITY_TYPE_DEPOSITS => Ok(ActivityType::Deposits),
            s if s == ACTIVITY_TYPE_DIVIDENDS => Ok(ActivityType::Dividends),
            s if s == ACTIVITY_TYPE_FX_CONVERSION => Ok(ActivityType::FxConversion),
            s if s == ACTIVITY_TYPE_WITHDRAWALS => Ok(ActivityType::Withdrawals),
            s if s == ACTIVITY_TYPE_TRADES => Ok(ActivityType::Trades),
            s if s == ACTIVITY_TYPE_TRANSFERS => Ok(ActivityType::Transfers),
            s if s == ACTIVITY_TYPE_OTHER => Ok(ActivityType::Other),
            s if s == ACTIVITY_TYPE_FEES_AND_REBATES => Ok(ActivityType::FeesAndRebates),
            s if s == ACTIVITY_TYPE_CORPORATE_ACTIONS => Ok(ActivityType::CorporateActions),
            _ => Err(format!("Unknown activity type: {}", s)),
        }
    }
}
