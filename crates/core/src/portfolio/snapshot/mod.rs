//! Portfolio snapshot module - ledger replay and point-in-time snapshots.

pub mod ledger_replayer;
mod ledger_model;
mod positions_model;
pub mod snapshot_engine;
mod snapshot_model;

pub use ledger_model::*;
pub use ledger_replayer::*;
pub use positions_model::*;
pub use snapshot_engine::*;
pub use snapshot_model::*;
