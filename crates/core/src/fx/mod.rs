//! FX module - exchange-rate graph used by in-memory oracles.

pub mod currency_converter;
mod fx_model;

pub use currency_converter::CurrencyConverter;
pub use fx_model::ExchangeRate;
