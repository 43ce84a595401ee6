//! Reference module - caller-owned lookup tables consulted during
//! normalization, replay and valuation.

mod reference_model;

pub use reference_model::{
    ReferenceTables, SymbolInfo, CORPORATE_ACTION_TABLE, SPLIT_MULTIPLIER_TABLE,
    SYMBOL_INFO_TABLE, TRANSFER_SYMBOL_TABLE,
};
