//! Flow classification for performance calculation.
//!
//! Only external flows (money or securities crossing the account boundary)
//! enter the Modified Dietz numerator and denominator. Trades, dividends and
//! fees are internal: they move value around inside the account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::debug;

use super::performance_model::CashFlowEvent;
use crate::errors::{Result, ValuationError};
use crate::market_data::{
    historical_fx_with_step_back, historical_price_with_step_back, MarketDataOracleTrait,
};
use crate::settings::Settings;
use crate::transactions::Transaction;

/// Flow type for performance calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Deposits, withdrawals and transfers in either direction
    External,
    /// Everything else
    Internal,
}

pub fn classify_flow(transaction: &Transaction) -> FlowType {
    if transaction.is_external_flow() {
        FlowType::External
    } else {
        FlowType::Internal
    }
}

/// Turns external-flow transactions into base-currency cash flow events.
#[derive(Clone)]
pub struct FlowClassifier {
    settings: Arc<Settings>,
    oracle: Arc<dyn MarketDataOracleTrait>,
    tz: Tz,
}

impl FlowClassifier {
    pub fn new(settings: Arc<Settings>, oracle: Arc<dyn MarketDataOracleTrait>) -> Result<Self> {
        let tz = settings.valuation_tz()?;
        Ok(Self {
            settings,
            oracle,
            tz,
        })
    }

    /// Cash rows flow their net amount. In-kind transfers flow the
    /// transferred quantity at that day's close. Each amount is converted to
    /// the base currency at the flow date's rate.
    pub fn cash_flows(&self, transactions: &[Transaction]) -> Result<Vec<CashFlowEvent>> {
        let flows = transactions
            .iter()
            .filter(|transaction| classify_flow(transaction) == FlowType::External)
            .map(|transaction| self.cash_flow(transaction))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Derived {} external flows from {} transactions",
            flows.len(),
            transactions.len()
        );
        Ok(flows)
    }

    fn cash_flow(&self, transaction: &Transaction) -> Result<CashFlowEvent> {
        let date = transaction.trade_date(self.tz);
        let max_days = self.settings.max_lookup_step_back_days;

        let local_amount = match transaction.symbol_code() {
            Some(symbol) => {
                let quote =
                    historical_price_with_step_back(self.oracle.as_ref(), symbol, date, max_days)
                        .map_err(|source| ValuationError::Price {
                            symbol: symbol.to_string(),
                            source,
                        })?;
                quote.value * transaction.quantity
            }
            None => transaction.net_amount,
        };

        let base = self.settings.base_currency.as_str();
        let fx_rate = historical_fx_with_step_back(
            self.oracle.as_ref(),
            &transaction.currency,
            base,
            date,
            max_days,
        )
        .map_err(|source| ValuationError::Fx {
            from: transaction.currency.clone(),
            to: base.to_string(),
            source,
        })?
        .value;

        Ok(CashFlowEvent {
            transaction_id: transaction.id.clone(),
            timestamp: transaction.timestamp,
            amount: local_amount * fx_rate,
        })
    }
}

/// The earliest external flow, else the earliest transaction.
pub fn inception(transactions: &[Transaction], flows: &[CashFlowEvent]) -> Option<DateTime<Utc>> {
    flows
        .iter()
        .map(|flow| flow.timestamp)
        .min()
        .or_else(|| transactions.iter().map(|t| t.timestamp).min())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::StaticMarketData;
    use crate::settings::{ReverseSplitPricing, TransferSymbolRule};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 16, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_transaction(
        id: &str,
        timestamp: DateTime<Utc>,
        activity_type: &str,
        symbol: Option<&str>,
        quantity: Decimal,
        net_amount: Decimal,
        currency: &str,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            timestamp,
            settlement_date: None,
            activity_type: activity_type.to_string(),
            action: String::new(),
            symbol: symbol.map(str::to_string),
            description: String::new(),
            quantity,
            price: Decimal::ZERO,
            gross_amount: Decimal::ZERO,
            commission: Decimal::ZERO,
            net_amount,
            currency: currency.to_string(),
        }
    }

    fn classifier(oracle: StaticMarketData) -> FlowClassifier {
        let settings = Arc::new(Settings::new(
            TransferSymbolRule::LookupThenSuffix,
            ReverseSplitPricing::FetchWhenMissing,
        ));
        let oracle: Arc<dyn MarketDataOracleTrait> = Arc::new(oracle);
        FlowClassifier::new(settings, oracle).unwrap()
    }

    #[test]
    fn test_classify_flow() {
        let external = ["Deposits", "Withdrawals", "Transfers"];
        let internal = ["Trades", "Dividends", "FX conversion", "Fees and rebates", "Other"];

        for activity_type in external {
            let t = create_test_transaction("t", at(2021, 1, 4), activity_type, None, dec!(0), dec!(1), "CAD");
            assert_eq!(classify_flow(&t), FlowType::External, "{}", activity_type);
        }
        for activity_type in internal {
            let t = create_test_transaction("t", at(2021, 1, 4), activity_type, None, dec!(0), dec!(1), "CAD");
            assert_eq!(classify_flow(&t), FlowType::Internal, "{}", activity_type);
        }
    }

    #[test]
    fn test_cash_flows_convert_to_base_and_value_in_kind_transfers() {
        let oracle = StaticMarketData::new()
            .with_price("SPY", day(2021, 2, 5), dec!(390))
            .with_fx_rate("USD", "CAD", day(2021, 2, 5), dec!(1.28));
        let log = vec![
            create_test_transaction("row-1", at(2021, 1, 4), "Deposits", None, dec!(0), dec!(5000), "CAD"),
            create_test_transaction("row-2", at(2021, 1, 5), "Trades", Some("XIU.TO"), dec!(100), dec!(-2500), "CAD"),
            // Saturday transfer: price and rate step back to Friday.
            create_test_transaction("row-3", at(2021, 2, 6), "Transfers", Some("SPY"), dec!(10), dec!(0), "USD"),
            create_test_transaction("row-4", at(2021, 2, 8), "Withdrawals", None, dec!(0), dec!(-1000), "CAD"),
        ];

        let flows = classifier(oracle).cash_flows(&log).unwrap();

        let ids: Vec<&str> = flows.iter().map(|f| f.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["row-1", "row-3", "row-4"]);
        assert_eq!(flows[0].amount, dec!(5000));
        assert_eq!(flows[1].amount, dec!(4992));
        assert_eq!(flows[2].amount, dec!(-1000));
        assert_eq!(inception(&log, &flows), Some(at(2021, 1, 4)));
    }

    #[test]
    fn test_missing_transfer_price_is_an_error() {
        let log = vec![create_test_transaction(
            "row-1",
            at(2021, 2, 5),
            "Transfers",
            Some("SPY"),
            dec!(10),
            dec!(0),
            "USD",
        )];

        assert!(classifier(StaticMarketData::new()).cash_flows(&log).is_err());
    }

    #[test]
    fn test_inception_falls_back_to_first_transaction() {
        let log = vec![
            create_test_transaction("row-1", at(2021, 3, 1), "Dividends", None, dec!(0), dec!(5), "CAD"),
            create_test_transaction("row-2", at(2021, 3, 2), "Dividends", None, dec!(0), dec!(5), "CAD"),
        ];

        assert_eq!(inception(&log, &[]), Some(at(2021, 3, 1)));
        assert_eq!(inception(&[], &[]), None);
    }
}
