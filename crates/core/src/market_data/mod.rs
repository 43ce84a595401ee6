//! Market data module - the price/FX oracle seam and its helpers.

mod market_data_errors;
mod market_data_model;
mod market_data_traits;
pub mod retry;
mod static_provider;

pub use market_data_errors::MarketDataError;
pub use market_data_model::PricePoint;
pub use market_data_traits::MarketDataOracleTrait;
pub use retry::{historical_fx_with_step_back, historical_price_with_step_back, with_step_back};
pub use static_provider::StaticMarketData;
