//! Reads brokerage export text into rows and types individual fields.

use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use csv::{ReaderBuilder, Trim};
use log::debug;
use rust_decimal::Decimal;

use super::transactions_model::{RawTransaction, Transaction};
use crate::errors::{Error, Result, ValidationError};

/// Date-time layouts seen in brokerage exports, tried in order.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %I:%M:%S %p", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses comma-separated export text with a header row. Columns are
/// matched by header name; unknown columns are ignored.
pub fn parse_export_csv(content: &str) -> Result<Vec<RawTransaction>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize::<RawTransaction>() {
        rows.push(record.map_err(ValidationError::Export)?);
    }
    debug!("Read {} export rows", rows.len());
    Ok(rows)
}

/// Identifier for the `row_number`-th (1-based) export row.
pub fn transaction_id(row_number: usize) -> String {
    format!("row-{}", row_number)
}

/// Types one raw row. Timestamps without an offset are read as local time
/// in `tz`.
pub fn parse_raw_transaction(
    raw: &RawTransaction,
    row_number: usize,
    tz: Tz,
) -> Result<Transaction> {
    let timestamp = parse_timestamp(&raw.transaction_date, "Transaction Date", row_number, tz)?;
    let settlement_date = if raw.settlement_date.trim().is_empty() {
        None
    } else {
        Some(parse_timestamp(
            &raw.settlement_date,
            "Settlement Date",
            row_number,
            tz,
        )?)
    };

    if raw.activity_type.trim().is_empty() {
        return Err(ValidationError::MissingField(format!(
            "Activity Type (row {})",
            row_number
        ))
        .into());
    }

    let symbol = raw.symbol.trim();
    Ok(Transaction {
        id: transaction_id(row_number),
        timestamp,
        settlement_date,
        activity_type: raw.activity_type.trim().to_string(),
        action: raw.action.trim().to_string(),
        symbol: (!symbol.is_empty()).then(|| symbol.to_string()),
        description: raw.description.trim().to_string(),
        quantity: parse_decimal(&raw.quantity, "Quantity", row_number)?,
        price: parse_decimal(&raw.price, "Price", row_number)?,
        gross_amount: parse_decimal(&raw.gross_amount, "Gross Amount", row_number)?,
        commission: parse_decimal(&raw.commission, "Commission", row_number)?,
        net_amount: parse_decimal(&raw.net_amount, "Net Amount", row_number)?,
        currency: raw.currency.trim().to_uppercase(),
    })
}

/// Plain or scientific decimal; an empty field is zero.
pub fn parse_decimal(value: &str, field: &str, row: usize) -> Result<Decimal> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| {
            Error::from(ValidationError::DecimalParse {
                field: field.to_string(),
                value: value.to_string(),
                row,
            })
        })
}

pub fn parse_timestamp(value: &str, field: &str, row: usize, tz: Tz) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    let parse_error = || ValidationError::DateTimeParse {
        field: field.to_string(),
        value: value.to_string(),
        row,
    };

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(parse_error)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(parse_error().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TORONTO: Tz = chrono_tz::America::Toronto;

    #[test]
    fn test_parse_export_csv_by_header_name() {
        let content = "\
Transaction Date,Settlement Date,Action,Symbol,Description,Quantity,Price,Gross Amount,Commission,Net Amount,Currency,Account #,Activity Type,Account Type
2020-04-01 12:00:00 AM,2020-04-03 12:00:00 AM,Buy,SPY,SPDR S&P 500,10,250.00,-2500.00,-4.95,-2504.95,USD,123,Trades,Margin
2020-03-02 12:00:00 AM,2020-03-02 12:00:00 AM,CON,,CONTRIBUTION,0,0,0,0,5000,CAD,123,Deposits,Margin
";
        let rows = parse_export_csv(content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "SPY");
        assert_eq!(rows[0].activity_type, "Trades");
        assert_eq!(rows[1].symbol, "");
        assert_eq!(rows[1].net_amount, "5000");
    }

    #[test]
    fn test_parse_raw_transaction_types_fields() {
        let raw = RawTransaction {
            transaction_date: "2020-04-01 12:00:00 AM".to_string(),
            settlement_date: "".to_string(),
            action: "Buy".to_string(),
            symbol: " ".to_string(),
            description: "SPDR".to_string(),
            quantity: "1e1".to_string(),
            price: "250".to_string(),
            gross_amount: "-2,500.00".to_string(),
            commission: "".to_string(),
            net_amount: "-2500".to_string(),
            currency: "usd".to_string(),
            activity_type: "Trades".to_string(),
        };
        let tx = parse_raw_transaction(&raw, 7, TORONTO).unwrap();

        assert_eq!(tx.id, "row-7");
        assert_eq!(tx.quantity, dec!(10));
        assert_eq!(tx.gross_amount, dec!(-2500));
        assert_eq!(tx.commission, Decimal::ZERO);
        assert_eq!(tx.symbol, None);
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.settlement_date, None);
        // Midnight in Toronto during EDT.
        assert_eq!(tx.timestamp, Utc.with_ymd_and_hms(2020, 4, 1, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_afternoon_times_use_meridiem() {
        let ts = parse_timestamp("2021-01-15 03:30:00 PM", "Transaction Date", 1, TORONTO).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 1, 15, 20, 30, 0).unwrap());
    }

    #[test]
    fn test_bad_fields_name_the_row() {
        let err = parse_decimal("12abc", "Price", 4).unwrap_err();
        match err {
            Error::Validation(ValidationError::DecimalParse { field, row, .. }) => {
                assert_eq!(field, "Price");
                assert_eq!(row, 4);
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(parse_timestamp("04/01/2020", "Transaction Date", 2, TORONTO).is_err());
    }
}
