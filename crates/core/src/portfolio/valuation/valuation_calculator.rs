use crate::errors::{Error, Result, ValuationError};
use crate::market_data::{
    historical_fx_with_step_back, historical_price_with_step_back, MarketDataError,
    MarketDataOracleTrait, PricePoint,
};
use crate::portfolio::snapshot::{InstrumentKind, Position, Snapshot};
use crate::portfolio::valuation::{
    HoldingKind, OptionValuation, PricedHolding, ValuationPoint, ValuedSnapshot,
};
use crate::reference::ReferenceTables;
use crate::settings::Settings;
use crate::utils::time_utils::valuation_date_from_utc;

use chrono::NaiveDate;
use log::debug;
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

// symbol -> resolved quote
type PriceMap = HashMap<String, PricePoint>;
// currency -> rate into the base currency
type FxRateMap = HashMap<String, Decimal>;

const CASH_CLASS: &str = "Cash";
const OPTION_INSTRUMENT: &str = "Option";

/// Prices a snapshot's positions and cash in the base currency.
///
/// Quotes for distinct symbols and rates for distinct currencies are fetched
/// in parallel before any row is built. The first lookup that fails after
/// step-back fails the whole valuation; other valuations are unaffected.
///
/// Positions held at zero quantity (the old leg of a rename left behind by a
/// corporate action) are never quoted. Their rows carry a zero price.
#[derive(Clone)]
pub struct Valuator {
    settings: Arc<Settings>,
    reference: Arc<ReferenceTables>,
    oracle: Arc<dyn MarketDataOracleTrait>,
}

impl Valuator {
    pub fn new(
        settings: Arc<Settings>,
        reference: Arc<ReferenceTables>,
        oracle: Arc<dyn MarketDataOracleTrait>,
    ) -> Self {
        Self {
            settings,
            reference,
            oracle,
        }
    }

    pub fn value(&self, snapshot: &Snapshot, point: ValuationPoint) -> Result<ValuedSnapshot> {
        let valuation_date = match point {
            ValuationPoint::Latest => {
                valuation_date_from_utc(snapshot.asof, self.settings.valuation_tz()?)
            }
            ValuationPoint::Historical(date) => date,
        };
        let ledger = &snapshot.ledger;

        let prices = self.fetch_prices(ledger.positions.values(), point)?;
        let currencies = ledger
            .positions
            .values()
            .map(|position| position.currency.as_str())
            .chain(ledger.cash.keys().map(String::as_str));
        let fx_rates = self.fetch_fx_rates(currencies, point)?;

        let mut holdings = Vec::with_capacity(ledger.positions.len() + ledger.cash.len());
        for position in ledger.positions.values() {
            holdings.push(self.price_position(position, valuation_date, &prices, &fx_rates)?);
        }
        for (currency, balance) in &ledger.cash {
            let fx_rate = self.rate_to_base(&fx_rates, currency)?;
            holdings.push(cash_holding(currency, *balance, valuation_date, fx_rate));
        }

        let total_market_value: Decimal = holdings.iter().map(|h| h.market_value_base).sum();
        for holding in &mut holdings {
            holding.pct_portfolio = holding.market_value_base.checked_div(total_market_value);
        }

        debug!(
            "Valued snapshot at {} ({:?}): {} {} across {} rows",
            snapshot.asof,
            point,
            total_market_value,
            self.settings.base_currency,
            holdings.len()
        );

        Ok(ValuedSnapshot {
            asof: snapshot.asof,
            valuation_date,
            base_currency: self.settings.base_currency.clone(),
            total_market_value,
            holdings,
        })
    }

    fn fetch_prices<'a, I>(&self, positions: I, point: ValuationPoint) -> Result<PriceMap>
    where
        I: Iterator<Item = &'a Position>,
    {
        let symbols: Vec<&str> = positions
            .filter(|position| !position.quantity.is_zero())
            .map(price_symbol)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        symbols
            .par_iter()
            .map(|symbol| {
                self.fetch_price(symbol, point)
                    .map(|quote| (symbol.to_string(), quote))
                    .map_err(|source| ValuationError::Price {
                        symbol: symbol.to_string(),
                        source,
                    })
            })
            .collect::<std::result::Result<PriceMap, ValuationError>>()
            .map_err(Error::from)
    }

    /// Latest quotes go through the symbol's quote venue id when it has one;
    /// historical closes are keyed by the symbol itself.
    fn fetch_price(
        &self,
        symbol: &str,
        point: ValuationPoint,
    ) -> std::result::Result<PricePoint, MarketDataError> {
        match point {
            ValuationPoint::Latest => {
                let venue_id = self
                    .reference
                    .symbol_info
                    .get(symbol)
                    .and_then(|info| info.quote_venue_id.as_deref())
                    .unwrap_or(symbol);
                self.oracle.get_latest_price(venue_id)
            }
            ValuationPoint::Historical(date) => historical_price_with_step_back(
                self.oracle.as_ref(),
                symbol,
                date,
                self.settings.max_lookup_step_back_days,
            ),
        }
    }

    fn fetch_fx_rates<'a, I>(&self, currencies: I, point: ValuationPoint) -> Result<FxRateMap>
    where
        I: Iterator<Item = &'a str>,
    {
        let base = self.settings.base_currency.as_str();
        let foreign: Vec<&str> = currencies
            .filter(|currency| *currency != base)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut rates = foreign
            .par_iter()
            .map(|currency| {
                let rate = match point {
                    ValuationPoint::Latest => self.oracle.get_latest_fx(currency, base),
                    ValuationPoint::Historical(date) => historical_fx_with_step_back(
                        self.oracle.as_ref(),
                        currency,
                        base,
                        date,
                        self.settings.max_lookup_step_back_days,
                    )
                    .map(|quote| quote.value),
                };
                rate.map(|rate| (currency.to_string(), rate))
                    .map_err(|source| ValuationError::Fx {
                        from: currency.to_string(),
                        to: base.to_string(),
                        source,
                    })
            })
            .collect::<std::result::Result<FxRateMap, ValuationError>>()?;
        rates.insert(base.to_string(), Decimal::ONE);
        Ok(rates)
    }

    fn rate_to_base(&self, fx_rates: &FxRateMap, currency: &str) -> Result<Decimal> {
        fx_rates.get(currency).copied().ok_or_else(|| {
            ValuationError::Fx {
                from: currency.to_string(),
                to: self.settings.base_currency.clone(),
                source: MarketDataError::NotFound(format!("no rate fetched for {}", currency)),
            }
            .into()
        })
    }

    /// Options are classified and priced through their underlying.
    fn price_position(
        &self,
        position: &Position,
        valuation_date: NaiveDate,
        prices: &PriceMap,
        fx_rates: &FxRateMap,
    ) -> Result<PricedHolding> {
        let lookup_symbol = price_symbol(position);
        let held = !position.quantity.is_zero();
        let quote = match prices.get(lookup_symbol) {
            Some(quote) => *quote,
            None if !held => PricePoint::new(valuation_date, Decimal::ZERO),
            None => {
                return Err(ValuationError::Price {
                    symbol: lookup_symbol.to_string(),
                    source: MarketDataError::NotFound(format!(
                        "no quote fetched for {}",
                        lookup_symbol
                    )),
                }
                .into())
            }
        };
        let info = self.reference.symbol_info(lookup_symbol);
        let asset_class = info.map(|i| i.asset_class.clone());
        let region = info.and_then(|i| i.region.clone());

        let (kind, instrument, market_price, option) = match &position.instrument {
            InstrumentKind::Equity => (
                HoldingKind::Equity,
                info.map(|i| i.instrument.clone()),
                quote.value,
                None,
            ),
            InstrumentKind::Option(contract) => (
                HoldingKind::Option,
                Some(OPTION_INSTRUMENT.to_string()),
                if held {
                    contract.intrinsic_value(quote.value)
                } else {
                    Decimal::ZERO
                },
                Some(OptionValuation {
                    option_type: contract.option_type,
                    underlying_symbol: contract.underlying_symbol.clone(),
                    underlying_price: quote.value,
                    underlying_price_date: quote.date,
                    expiration: contract.expiration,
                    strike: contract.strike,
                    multiplier: contract.multiplier,
                }),
            ),
        };

        let fx_rate_to_base = self.rate_to_base(fx_rates, &position.currency)?;
        let market_price_base = market_price * fx_rate_to_base;
        let book_cost_base = position.average_cost * fx_rate_to_base;

        Ok(PricedHolding {
            symbol: position.symbol.clone(),
            currency: position.currency.clone(),
            kind,
            instrument,
            asset_class,
            region,
            quantity: position.quantity,
            market_price,
            price_date: quote.date,
            book_cost: position.average_cost,
            fx_rate_to_base,
            market_price_base,
            book_cost_base,
            market_value_base: position.quantity * market_price_base,
            pnl_base: (market_price_base - book_cost_base) * position.quantity,
            pct_return: if held {
                pct_return(market_price_base, book_cost_base)
            } else {
                None
            },
            pct_portfolio: None,
            option,
        })
    }
}

fn price_symbol(position: &Position) -> &str {
    match &position.instrument {
        InstrumentKind::Equity => &position.symbol,
        InstrumentKind::Option(contract) => &contract.underlying_symbol,
    }
}

fn pct_return(market_price: Decimal, book_cost: Decimal) -> Option<Decimal> {
    market_price
        .checked_div(book_cost)
        .map(|ratio| ratio - Decimal::ONE)
}

/// Cash is a holding priced at one unit of its own currency.
fn cash_holding(
    currency: &str,
    balance: Decimal,
    valuation_date: NaiveDate,
    fx_rate_to_base: Decimal,
) -> PricedHolding {
    PricedHolding {
        symbol: currency.to_string(),
        currency: currency.to_string(),
        kind: HoldingKind::Cash,
        instrument: Some(CASH_CLASS.to_string()),
        asset_class: Some(CASH_CLASS.to_string()),
        region: Some(CASH_CLASS.to_string()),
        quantity: balance,
        market_price: Decimal::ONE,
        price_date: valuation_date,
        book_cost: Decimal::ONE,
        fx_rate_to_base,
        market_price_base: fx_rate_to_base,
        book_cost_base: fx_rate_to_base,
        market_value_base: balance * fx_rate_to_base,
        pnl_base: Decimal::ZERO,
        pct_return: Some(Decimal::ZERO),
        pct_portfolio: None,
        option: None,
    }
}
