//! Portfolio performance module - external flows, lookback windows and
//! Modified Dietz returns.

mod flow_classifier;
mod lookback_windows;
mod performance_calculator;
pub mod performance_model;

pub use flow_classifier::{classify_flow, inception, FlowClassifier, FlowType};
pub use lookback_windows::{lookback_windows, SINCE_INCEPTION, YEAR_TO_DATE};
pub use performance_calculator::PerformanceCalculator;
pub use performance_model::*;
