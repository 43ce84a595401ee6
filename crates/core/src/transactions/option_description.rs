//! Option contract descriptions.
//!
//! Option trades carry the contract in the free-text description, e.g.
//! `PUT SPY 04/17/20 224 STANDARD & POORS DEPOSITORY WE ACTED AS AGENT`:
//! type, underlying, expiration (`MM/DD/YY`), strike, then noise.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

static OPTION_DESCRIPTION: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

const OPTION_DESCRIPTION_PATTERN: &str =
    r"^(PUT|CALL)\s+(\S+)\s+(\d{1,2}/\d{1,2}/\d{2})\s+(\d+(?:\.\d+)?)(?:\s|$)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter code used in canonical option symbols.
    pub fn code(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

/// The contract terms parsed out of a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescription {
    pub option_type: OptionType,
    pub underlying_symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
}

impl OptionDescription {
    /// Canonical symbol for the contract, e.g. `SPY17Apr2020P224.00`.
    pub fn symbol(&self) -> String {
        option_symbol(
            &self.underlying_symbol,
            self.expiration,
            self.option_type,
            self.strike,
        )
    }
}

pub fn option_symbol(
    underlying_symbol: &str,
    expiration: NaiveDate,
    option_type: OptionType,
    strike: Decimal,
) -> String {
    format!(
        "{}{}{}{:.2}",
        underlying_symbol,
        expiration.format("%d%b%Y"),
        option_type.code(),
        strike
    )
}

/// Parses an option description. Dots are removed from the underlying, and
/// underlyings quoted in `suffix_currency` gain `market_suffix`.
///
/// The error is a human-readable reason; callers attach transaction context.
pub fn parse_option_description(
    description: &str,
    currency: &str,
    market_suffix: &str,
    suffix_currency: &str,
) -> Result<OptionDescription, String> {
    let pattern = OPTION_DESCRIPTION
        .get_or_init(|| Regex::new(OPTION_DESCRIPTION_PATTERN))
        .as_ref()
        .map_err(|e| e.to_string())?;

    let captures = pattern
        .captures(description.trim())
        .ok_or_else(|| "expected '<PUT|CALL> <underlying> <MM/DD/YY> <strike>'".to_string())?;

    let option_type = match &captures[1] {
        "CALL" => OptionType::Call,
        _ => OptionType::Put,
    };

    let mut underlying_symbol = captures[2].replace('.', "");
    if currency == suffix_currency && !underlying_symbol.contains(market_suffix) {
        underlying_symbol.push_str(market_suffix);
    }

    let expiration = NaiveDate::parse_from_str(&captures[3], "%m/%d/%y")
        .map_err(|e| format!("bad expiration '{}': {}", &captures[3], e))?;

    let strike = Decimal::from_str(&captures[4])
        .map_err(|e| format!("bad strike '{}': {}", &captures[4], e))?;

    Ok(OptionDescription {
        option_type,
        underlying_symbol,
        expiration,
        strike,
    })
}
