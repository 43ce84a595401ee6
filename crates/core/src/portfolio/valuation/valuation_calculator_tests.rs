use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{Error, ValuationError};
use crate::market_data::{MarketDataOracleTrait, StaticMarketData};
use crate::portfolio::snapshot::{Ledger, OptionContract, Position, Snapshot};
use crate::reference::{ReferenceTables, SymbolInfo};
use crate::settings::{ReverseSplitPricing, Settings, TransferSymbolRule};
use crate::transactions::OptionType;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn holding(symbol: &str, currency: &str, quantity: Decimal, average_cost: Decimal) -> Position {
    let mut position = Position::equity(symbol, currency);
    position.quantity = quantity;
    position.average_cost = average_cost;
    position
}

fn spy_put(quantity: Decimal) -> Position {
    let contract = OptionContract {
        option_type: OptionType::Put,
        underlying_symbol: "SPY".to_string(),
        expiration: day(2021, 9, 17),
        strike: dec!(224),
        multiplier: dec!(100),
    };
    let mut position = Position::option("SPY17Sep2021P224.00", "USD", contract);
    position.quantity = quantity;
    position.average_cost = dec!(310);
    position
}

fn ledger(cash: &[(&str, Decimal)], positions: Vec<Position>) -> Ledger {
    let mut ledger = Ledger::default();
    for (currency, amount) in cash {
        ledger.add_cash(currency, *amount);
    }
    for position in positions {
        ledger.positions.insert(position.symbol.clone(), position);
    }
    ledger
}

fn snapshot(ledger: Ledger) -> Snapshot {
    Snapshot::new(Utc.with_ymd_and_hms(2021, 6, 5, 16, 0, 0).unwrap(), ledger, 0)
}

fn reference() -> ReferenceTables {
    ReferenceTables::new()
        .with_symbol_info(
            "XIU.TO",
            SymbolInfo::new("ETF", "Canadian Equity", Some("Canada")).with_quote_venue_id("TSX:XIU"),
        )
        .with_symbol_info("SPY", SymbolInfo::new("ETF", "US Equity", Some("United States")))
}

fn oracle() -> StaticMarketData {
    StaticMarketData::new()
        .with_price("XIU.TO", day(2021, 6, 4), dec!(27))
        .with_price("SPY", day(2021, 6, 4), dec!(400))
        .with_price("SPY", day(2021, 6, 1), dec!(220))
        .with_price("TSX:XIU", day(2021, 6, 5), dec!(28))
        .with_fx_rate("USD", "CAD", day(2021, 6, 4), dec!(1.25))
}

fn valuator_with(oracle: StaticMarketData, reference: ReferenceTables) -> Valuator {
    let settings = Arc::new(Settings::new(
        TransferSymbolRule::LookupThenSuffix,
        ReverseSplitPricing::FetchWhenMissing,
    ));
    let oracle: Arc<dyn MarketDataOracleTrait> = Arc::new(oracle);
    Valuator::new(settings, Arc::new(reference), oracle)
}

fn valuator() -> Valuator {
    valuator_with(oracle(), reference())
}

#[test]
fn test_historical_valuation_converts_to_base() {
    let snapshot = snapshot(ledger(
        &[("CAD", dec!(2300)), ("USD", Decimal::ZERO)],
        vec![
            holding("XIU.TO", "CAD", dec!(100), dec!(25)),
            holding("SPY", "USD", dec!(10), dec!(320)),
        ],
    ));

    // Saturday: prices and rates step back to Friday's close.
    let valued = valuator()
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 5)))
        .unwrap();

    assert_eq!(valued.base_currency, "CAD");
    assert_eq!(valued.valuation_date, day(2021, 6, 5));
    assert_eq!(valued.total_market_value, dec!(10000));
    assert_eq!(valued.cash_value_base(), dec!(2300));

    let spy = valued.holding("SPY").unwrap();
    assert_eq!(spy.kind, HoldingKind::Equity);
    assert_eq!(spy.price_date, day(2021, 6, 4));
    assert_eq!(spy.fx_rate_to_base, dec!(1.25));
    assert_eq!(spy.market_price_base, dec!(500));
    assert_eq!(spy.book_cost_base, dec!(400));
    assert_eq!(spy.market_value_base, dec!(5000));
    assert_eq!(spy.pnl_base, dec!(1000));
    assert_eq!(spy.pct_return, Some(dec!(0.25)));
    assert_eq!(spy.pct_portfolio, Some(dec!(0.5)));
    assert_eq!(spy.asset_class.as_deref(), Some("US Equity"));

    let xiu = valued.holding("XIU.TO").unwrap();
    assert_eq!(xiu.fx_rate_to_base, Decimal::ONE);
    assert_eq!(xiu.market_value_base, dec!(2700));
    assert_eq!(xiu.pct_return, Some(dec!(0.08)));
    assert_eq!(xiu.pct_portfolio, Some(dec!(0.27)));
    assert_eq!(xiu.instrument.as_deref(), Some("ETF"));
}

#[test]
fn test_rows_list_positions_then_cash() {
    let snapshot = snapshot(ledger(
        &[("CAD", dec!(100)), ("USD", dec!(10))],
        vec![
            holding("XIU.TO", "CAD", dec!(1), dec!(25)),
            holding("SPY", "USD", dec!(1), dec!(320)),
        ],
    ));

    let valued = valuator()
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4)))
        .unwrap();
    let symbols: Vec<&str> = valued.holdings.iter().map(|h| h.symbol.as_str()).collect();

    assert_eq!(symbols, vec!["SPY", "XIU.TO", "CAD", "USD"]);
    let usd = valued.cash().find(|h| h.symbol == "USD").unwrap();
    assert_eq!(usd.market_price, Decimal::ONE);
    assert_eq!(usd.book_cost, Decimal::ONE);
    assert_eq!(usd.market_value_base, dec!(12.5));
    assert_eq!(usd.asset_class.as_deref(), Some("Cash"));
}

#[test]
fn test_option_valued_at_intrinsic_value_of_underlying() {
    let snapshot = snapshot(ledger(&[("CAD", Decimal::ZERO)], vec![spy_put(dec!(2))]));
    let oracle = oracle().with_fx_rate("USD", "CAD", day(2021, 6, 1), dec!(1.25));

    let valued = valuator_with(oracle, reference())
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 1)))
        .unwrap();
    let put = valued.holding("SPY17Sep2021P224.00").unwrap();
    let detail = put.option.as_ref().unwrap();

    assert_eq!(put.kind, HoldingKind::Option);
    assert_eq!(put.instrument.as_deref(), Some("Option"));
    assert_eq!(put.asset_class.as_deref(), Some("US Equity"));
    // (224 - 220) * 100 per contract
    assert_eq!(put.market_price, dec!(400));
    assert_eq!(put.market_value_base, dec!(1000));
    assert_eq!(detail.underlying_price, dec!(220));
    assert_eq!(detail.strike, dec!(224));
    assert_eq!(valued.total_market_value, dec!(1000));
}

#[test]
fn test_out_of_the_money_option_is_worthless() {
    let snapshot = snapshot(ledger(&[], vec![spy_put(dec!(1))]));

    let valued = valuator()
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4)))
        .unwrap();
    let put = valued.holding("SPY17Sep2021P224.00").unwrap();

    assert_eq!(put.market_price, Decimal::ZERO);
    assert_eq!(put.pct_return, Some(dec!(-1)));
    assert_eq!(valued.total_market_value, Decimal::ZERO);
    assert_eq!(put.pct_portfolio, None);
}

#[test]
fn test_latest_valuation_uses_quote_venue() {
    let snapshot = snapshot(ledger(
        &[("CAD", Decimal::ZERO)],
        vec![holding("XIU.TO", "CAD", dec!(10), dec!(25))],
    ));

    let valued = valuator().value(&snapshot, ValuationPoint::Latest).unwrap();
    let xiu = valued.holding("XIU.TO").unwrap();

    assert_eq!(xiu.market_price, dec!(28));
    assert_eq!(xiu.price_date, day(2021, 6, 5));
    assert_eq!(valued.valuation_date, day(2021, 6, 5));
    assert_eq!(valued.total_market_value, dec!(280));
}

#[test]
fn test_zero_book_cost_has_no_return() {
    let snapshot = snapshot(ledger(&[], vec![holding("XIU.TO", "CAD", dec!(10), Decimal::ZERO)]));

    let valued = valuator()
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4)))
        .unwrap();

    assert_eq!(valued.holding("XIU.TO").unwrap().pct_return, None);
}

#[test]
fn test_unclassified_symbol_is_priced_without_classification() {
    let snapshot = snapshot(ledger(&[], vec![holding("XIU.TO", "CAD", dec!(1), dec!(25))]));

    let valued = valuator_with(oracle(), ReferenceTables::new())
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4)))
        .unwrap();
    let xiu = valued.holding("XIU.TO").unwrap();

    assert_eq!(xiu.market_value_base, dec!(27));
    assert_eq!(xiu.asset_class, None);
    assert_eq!(xiu.region, None);
}

#[test]
fn test_missing_quote_fails_valuation() {
    let snapshot = snapshot(ledger(&[], vec![holding("VFV.TO", "CAD", dec!(1), dec!(90))]));

    match valuator().value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4))) {
        Err(Error::Valuation(ValuationError::Price { symbol, .. })) => assert_eq!(symbol, "VFV.TO"),
        other => panic!("expected a price error, got {:?}", other),
    }
}

#[test]
fn test_missing_fx_rate_fails_valuation() {
    let snapshot = snapshot(ledger(&[("EUR", dec!(10))], vec![]));

    match valuator().value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4))) {
        Err(Error::Valuation(ValuationError::Fx { from, to, .. })) => {
            assert_eq!(from, "EUR");
            assert_eq!(to, "CAD");
        }
        other => panic!("expected an fx error, got {:?}", other),
    }
}

#[test]
fn test_renamed_symbol_at_zero_is_not_quoted() {
    // The old leg of a name change stays at zero; the oracle has no quotes
    // for the retired ticker.
    let snapshot = snapshot(ledger(
        &[("CAD", dec!(100))],
        vec![
            holding("OLD.TO", "CAD", Decimal::ZERO, dec!(12)),
            holding("XIU.TO", "CAD", dec!(10), dec!(25)),
        ],
    ));

    for point in [ValuationPoint::Historical(day(2021, 6, 4)), ValuationPoint::Latest] {
        let valued = valuator().value(&snapshot, point).unwrap();
        let old = valued.holding("OLD.TO").unwrap();

        assert_eq!(old.quantity, Decimal::ZERO);
        assert_eq!(old.market_price, Decimal::ZERO);
        assert_eq!(old.market_value_base, Decimal::ZERO);
        assert_eq!(old.pnl_base, Decimal::ZERO);
        assert_eq!(old.pct_return, None);
        assert_eq!(old.price_date, valued.valuation_date);
    }
}

#[test]
fn test_option_at_zero_quantity_is_not_quoted() {
    let snapshot = snapshot(ledger(&[], vec![spy_put(Decimal::ZERO)]));

    let oracle = StaticMarketData::new().with_fx_rate("USD", "CAD", day(2021, 6, 4), dec!(1.25));

    let valued = valuator_with(oracle, reference())
        .value(&snapshot, ValuationPoint::Historical(day(2021, 6, 4)))
        .unwrap();
    let put = valued.holding("SPY17Sep2021P224.00").unwrap();

    assert_eq!(put.market_price, Decimal::ZERO);
    assert_eq!(put.market_value_base, Decimal::ZERO);
}
