//! Portfolio snapshot domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Ledger;

/// A ledger pinned to the cutoff it was replayed up to. Never mutated after
/// the engine returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub asof: DateTime<Utc>,
    pub ledger: Ledger,
    /// Number of log transactions replayed into `ledger`.
    pub transaction_count: usize,
}

impl Snapshot {
    pub fn new(asof: DateTime<Utc>, ledger: Ledger, transaction_count: usize) -> Self {
        Snapshot {
            asof,
            ledger,
            transaction_count,
        }
    }
}
