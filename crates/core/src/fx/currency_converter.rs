use crate::fx::fx_model::ExchangeRate;
use crate::market_data::MarketDataError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Which observation of each pair a conversion should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RateSelector {
    /// Only a rate stamped exactly on this date. Gaps are reported as
    /// `NoData` so callers can step the date back themselves.
    On(NaiveDate),
    /// The most recent observation of each pair.
    Latest,
}

/// A calculator for currency conversions using a graph-based approach.
/// It stores rates as independent time-series per pair and calculates paths on demand.
#[derive(Debug, Default, Clone)]
pub struct CurrencyConverter {
    /// Graph adjacency list: Currency -> Set of connected currencies.
    adj: HashMap<String, HashSet<String>>,

    /// Key: (From_Currency, To_Currency), Value: date-ordered rates.
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut converter = CurrencyConverter::default();
        converter.add_historical_rates(exchange_rates);
        converter
    }

    /// Adds historical FX rates. Inverses and graph connectivity are maintained
    /// automatically; an explicitly supplied inverse wins over a derived one.
    pub fn add_historical_rates(&mut self, rates: Vec<ExchangeRate>) {
        for rate in rates {
            if rate.from_currency == rate.to_currency {
                continue;
            }

            let forward_pair = (rate.from_currency.clone(), rate.to_currency.clone());
            let inverse_pair = (rate.to_currency.clone(), rate.from_currency.clone());

            self.rates
                .entry(forward_pair)
                .or_default()
                .insert(rate.date, rate.rate);
            self.adj
                .entry(rate.from_currency.clone())
                .or_default()
                .insert(rate.to_currency.clone());

            if !rate.rate.is_zero() {
                let explicit_inverse = self
                    .rates
                    .get(&inverse_pair)
                    .map(|history| history.contains_key(&rate.date))
                    .unwrap_or(false);
                if !explicit_inverse {
                    self.rates
                        .entry(inverse_pair)
                        .or_default()
                        .insert(rate.date, Decimal::ONE / rate.rate);
                }
                self.adj
                    .entry(rate.to_currency.clone())
                    .or_default()
                    .insert(rate.from_currency.clone());
            }
        }
    }

    fn get_direct_rate(&self, from: &str, to: &str, selector: RateSelector) -> Option<Decimal> {
        let history = self.rates.get(&(from.to_string(), to.to_string()))?;
        match selector {
            RateSelector::On(date) => history.get(&date).copied(),
            RateSelector::Latest => history.values().next_back().copied(),
        }
    }

    /// Breadth-first search over currencies; every hop must have a rate for
    /// the selector.
    fn find_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
        selector: RateSelector,
    ) -> Option<Decimal> {
        if from_currency == to_currency {
            return Some(Decimal::ONE);
        }

        let mut queue: VecDeque<(String, Decimal)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();

        queue.push_back((from_currency.to_string(), Decimal::ONE));
        visited.insert(from_currency.to_string());

        while let Some((current_curr, current_rate)) = queue.pop_front() {
            if current_curr == to_currency {
                return Some(current_rate);
            }

            if let Some(neighbors) = self.adj.get(&current_curr) {
                // Sorted so the chosen path does not depend on hash order.
                let mut neighbors: Vec<&String> = neighbors.iter().collect();
                neighbors.sort();
                for neighbor in neighbors {
                    if !visited.contains(neighbor) {
                        if let Some(rate) = self.get_direct_rate(&current_curr, neighbor, selector)
                        {
                            visited.insert(neighbor.clone());
                            queue.push_back((neighbor.clone(), current_rate * rate));
                        }
                    }
                }
            }
        }
        None
    }

    fn knows(&self, currency: &str) -> bool {
        self.adj.contains_key(currency)
    }

    /// Rate for `from -> to` observed exactly on `date`.
    pub fn get_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        if from_currency != to_currency
            && (!self.knows(from_currency) || !self.knows(to_currency))
        {
            return Err(MarketDataError::NotFound(format!(
                "no exchange rates for {}{}",
                from_currency, to_currency
            )));
        }
        self.find_rate(from_currency, to_currency, RateSelector::On(date))
            .ok_or_else(|| {
                MarketDataError::NoData(format!(
                    "no {}{} rate on {}",
                    from_currency, to_currency, date
                ))
            })
    }

    /// Rate for `from -> to` built from the latest observation of every hop.
    pub fn get_latest_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Decimal, MarketDataError> {
        self.find_rate(from_currency, to_currency, RateSelector::Latest)
            .ok_or_else(|| {
                MarketDataError::NotFound(format!(
                    "no conversion path for {}{}",
                    from_currency, to_currency
                ))
            })
    }
}
