use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money crossing the account boundary, in the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEvent {
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    /// Positive for money in, negative for money out.
    pub amount: Decimal,
}

/// A named period ending now, e.g. `1 Month`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookbackWindow {
    pub label: String,
    pub start: DateTime<Utc>,
}

impl LookbackWindow {
    pub fn new(label: &str, start: DateTime<Utc>) -> Self {
        LookbackWindow {
            label: label.to_string(),
            start,
        }
    }
}

/// Modified Dietz result for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowReturn {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub starting_value: Decimal,
    pub ending_value: Decimal,
    pub net_flow: Decimal,
    pub weighted_flow: Decimal,
    pub flow_count: usize,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFailure {
    pub label: String,
    pub start: DateTime<Utc>,
    pub reason: String,
}

/// Returns for every window that could be measured, in window order, and the
/// reason for each window that could not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub asof: DateTime<Utc>,
    pub base_currency: String,
    pub inception: DateTime<Utc>,
    pub ending_value: Decimal,
    pub windows: Vec<WindowReturn>,
    pub failures: Vec<WindowFailure>,
}

impl PerformanceReport {
    pub fn window(&self, label: &str) -> Option<&WindowReturn> {
        self.windows.iter().find(|window| window.label == label)
    }

    /// Window label -> return ratio, in window order.
    pub fn returns(&self) -> Vec<(&str, Decimal)> {
        self.windows
            .iter()
            .map(|window| (window.label.as_str(), window.rate))
            .collect()
    }
}
