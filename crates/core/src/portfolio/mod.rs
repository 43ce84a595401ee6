//! Portfolio module - replay, valuation and performance over a transaction log.

pub mod performance;
pub mod portfolio_service;
pub mod portfolio_traits;
pub mod snapshot;
pub mod valuation;

pub use portfolio_service::PortfolioService;
pub use portfolio_traits::PortfolioServiceTrait;
