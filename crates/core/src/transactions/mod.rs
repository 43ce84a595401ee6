//! Transactions module - export rows, normalized transactions, option
//! descriptions and the normalizer.

pub mod export_parser;
mod normalizer;
mod option_description;
mod transactions_constants;
mod transactions_model;


pub use export_parser::{parse_export_csv, parse_raw_transaction};
pub use normalizer::{journal_destination_symbol, TransactionNormalizer};
pub use option_description::{
    option_symbol, parse_option_description, OptionDescription, OptionType,
};
pub use transactions_constants::*;
pub use transactions_model::{ActivityType, RawTransaction, Transaction};
