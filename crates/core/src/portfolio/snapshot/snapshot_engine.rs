//! Point-in-time ledgers.
//!
//! A snapshot is always a fresh replay of the log prefix up to its cutoff.
//! Corporate actions rewrite symbol identity anywhere in history, so a
//! ledger is never patched forward from an earlier one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use rayon::prelude::*;

use super::ledger_replayer::LedgerReplayer;
use super::snapshot_model::Snapshot;
use crate::errors::Result;
use crate::transactions::Transaction;

#[derive(Clone)]
pub struct SnapshotEngine {
    transactions: Arc<Vec<Transaction>>,
    replayer: LedgerReplayer,
}

impl SnapshotEngine {
    /// `transactions` must be the normalized, chronologically sorted log.
    pub fn new(transactions: Arc<Vec<Transaction>>, replayer: LedgerReplayer) -> Self {
        Self {
            transactions,
            replayer,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The log prefix with timestamp <= `cutoff`.
    pub fn prefix(&self, cutoff: DateTime<Utc>) -> &[Transaction] {
        let end = self
            .transactions
            .partition_point(|transaction| transaction.timestamp <= cutoff);
        &self.transactions[..end]
    }

    /// Replays the prefix up to `cutoff` into a new ledger.
    pub fn snapshot(&self, cutoff: DateTime<Utc>) -> Result<Snapshot> {
        let prefix = self.prefix(cutoff);
        debug!(
            "Building snapshot at {} from {} of {} transactions",
            cutoff,
            prefix.len(),
            self.transactions.len()
        );
        let ledger = self.replayer.replay(prefix)?;
        Ok(Snapshot::new(cutoff, ledger, prefix.len()))
    }

    /// Independent snapshots for several cutoffs, built in parallel. Results
    /// are returned in the order of `cutoffs`; one cutoff failing does not
    /// affect the others.
    pub fn snapshots(&self, cutoffs: &[DateTime<Utc>]) -> Vec<Result<Snapshot>> {
        cutoffs
            .par_iter()
            .map(|cutoff| self.snapshot(*cutoff))
            .collect()
    }
}
