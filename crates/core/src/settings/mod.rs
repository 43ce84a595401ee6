//! Settings module - replay, normalization and valuation configuration.

mod settings_model;

pub use settings_model::{ReverseSplitPricing, Settings, TransferSymbolRule};
