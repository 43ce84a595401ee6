//! End-to-end pipeline: raw export -> normalized log -> snapshots ->
//! valuations -> performance report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use rayon::prelude::*;

use super::performance::{
    inception, lookback_windows, FlowClassifier, PerformanceCalculator, PerformanceReport,
};
use super::portfolio_traits::PortfolioServiceTrait;
use super::snapshot::{LedgerReplayer, Snapshot, SnapshotEngine};
use super::valuation::{ValuationPoint, ValuedSnapshot, Valuator};
use crate::errors::{Result, ValidationError};
use crate::market_data::MarketDataOracleTrait;
use crate::reference::ReferenceTables;
use crate::settings::Settings;
use crate::transactions::{parse_export_csv, RawTransaction, Transaction, TransactionNormalizer};
use crate::utils::time_utils::valuation_date_from_utc;

/// Service wiring the replay, valuation and performance stages over one
/// immutable transaction log.
pub struct PortfolioService {
    tz: Tz,
    engine: SnapshotEngine,
    valuator: Valuator,
    flows: FlowClassifier,
}

impl PortfolioService {
    /// Builds the service over an already normalized, sorted log.
    pub fn new(
        settings: Arc<Settings>,
        reference: Arc<ReferenceTables>,
        oracle: Arc<dyn MarketDataOracleTrait>,
        transactions: Vec<Transaction>,
    ) -> Result<Self> {
        settings.validate()?;
        let tz = settings.valuation_tz()?;
        let replayer = LedgerReplayer::new(settings.clone(), reference.clone(), oracle.clone())?;
        Ok(Self {
            tz,
            engine: SnapshotEngine::new(Arc::new(transactions), replayer),
            valuator: Valuator::new(settings.clone(), reference, oracle.clone()),
            flows: FlowClassifier::new(settings, oracle)?,
        })
    }

    /// Normalizes raw export rows, then builds the service.
    pub fn from_raw(
        settings: Arc<Settings>,
        reference: Arc<ReferenceTables>,
        oracle: Arc<dyn MarketDataOracleTrait>,
        rows: &[RawTransaction],
    ) -> Result<Self> {
        settings.validate()?;
        let transactions =
            TransactionNormalizer::new(settings.clone(), reference.clone()).normalize(rows)?;
        info!("Normalized {} export rows", transactions.len());
        Self::new(settings, reference, oracle, transactions)
    }

    /// Reads export CSV text, then normalizes and builds the service.
    pub fn from_export_csv(
        settings: Arc<Settings>,
        reference: Arc<ReferenceTables>,
        oracle: Arc<dyn MarketDataOracleTrait>,
        content: &str,
    ) -> Result<Self> {
        let rows = parse_export_csv(content)?;
        Self::from_raw(settings, reference, oracle, &rows)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.engine.transactions()
    }

    pub fn snapshot(&self, cutoff: DateTime<Utc>) -> Result<Snapshot> {
        self.engine.snapshot(cutoff)
    }

    fn value_historical(&self, snapshot: &Snapshot) -> Result<ValuedSnapshot> {
        let date = valuation_date_from_utc(snapshot.asof, self.tz);
        self.valuator
            .value(snapshot, ValuationPoint::Historical(date))
    }
}

impl PortfolioServiceTrait for PortfolioService {
    fn current_holdings(&self, now: DateTime<Utc>) -> Result<ValuedSnapshot> {
        let snapshot = self.engine.snapshot(now)?;
        self.valuator.value(&snapshot, ValuationPoint::Latest)
    }

    fn holdings_at(&self, cutoff: DateTime<Utc>) -> Result<ValuedSnapshot> {
        let snapshot = self.engine.snapshot(cutoff)?;
        self.value_historical(&snapshot)
    }

    /// Replay and flow derivation failures abort. A window whose starting
    /// valuation fails is reported in `failures` and the others still run.
    fn measure(&self, now: DateTime<Utc>) -> Result<PerformanceReport> {
        let current = self.current_holdings(now)?;
        let transactions = self.engine.transactions();
        let flows = self.flows.cash_flows(transactions)?;
        let inception = inception(transactions, &flows).ok_or_else(|| {
            ValidationError::InvalidInput("cannot measure an empty transaction log".to_string())
        })?;

        let windows = lookback_windows(now, inception);
        info!(
            "Measuring {} windows from inception {} to {}",
            windows.len(),
            inception,
            now
        );

        let cutoffs: Vec<DateTime<Utc>> = windows.iter().map(|window| window.start).collect();
        let snapshots = self
            .engine
            .snapshots(&cutoffs)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let start_valuations: Vec<Result<ValuedSnapshot>> = snapshots
            .par_iter()
            .map(|snapshot| self.value_historical(snapshot))
            .collect();
        debug!("Valued {} window snapshots", start_valuations.len());

        let windows = windows.into_iter().zip(start_valuations).collect();
        Ok(PerformanceCalculator::calculate(
            &current, inception, windows, &flows,
        ))
    }
}
