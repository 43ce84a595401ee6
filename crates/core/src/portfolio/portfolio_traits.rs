use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::portfolio::performance::PerformanceReport;
use crate::portfolio::valuation::ValuedSnapshot;

/// Trait defining the contract for the end-to-end portfolio pipeline.
pub trait PortfolioServiceTrait: Send + Sync {
    /// Holdings replayed up to `now` and priced at the latest quotes.
    fn current_holdings(&self, now: DateTime<Utc>) -> Result<ValuedSnapshot>;

    /// Holdings replayed up to `cutoff` and priced at that day's close.
    fn holdings_at(&self, cutoff: DateTime<Utc>) -> Result<ValuedSnapshot>;

    /// Modified Dietz return for every lookback window ending at `now`.
    fn measure(&self, now: DateTime<Utc>) -> Result<PerformanceReport>;
}
