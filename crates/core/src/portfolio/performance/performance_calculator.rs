//! Modified Dietz returns over lookback windows.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;

use super::performance_model::{
    CashFlowEvent, LookbackWindow, PerformanceReport, WindowFailure, WindowReturn,
};
use crate::errors::{Error, PerformanceError};
use crate::portfolio::valuation::ValuedSnapshot;

type WindowResult<T> = std::result::Result<T, PerformanceError>;

pub struct PerformanceCalculator;

impl PerformanceCalculator {
    /// Modified Dietz return between `start` and `end`:
    /// `(V1 - V0 - F) / (V0 + sum(f * (end - t) / (end - start)))`, counting
    /// flows with `start < t <= end`.
    pub fn modified_dietz(
        label: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        starting_value: Decimal,
        ending_value: Decimal,
        flows: &[CashFlowEvent],
    ) -> WindowResult<WindowReturn> {
        let span = Decimal::from((end - start).num_milliseconds());
        if span <= Decimal::ZERO {
            return Err(PerformanceError::EmptyWindow(label.to_string()));
        }

        let mut net_flow = Decimal::ZERO;
        let mut weighted_flow = Decimal::ZERO;
        let mut flow_count = 0;
        for flow in flows
            .iter()
            .filter(|flow| flow.timestamp > start && flow.timestamp <= end)
        {
            let remaining = Decimal::from((end - flow.timestamp).num_milliseconds());
            net_flow += flow.amount;
            weighted_flow += flow.amount * remaining / span;
            flow_count += 1;
        }

        let rate = (ending_value - starting_value - net_flow)
            .checked_div(starting_value + weighted_flow)
            .ok_or_else(|| PerformanceError::ZeroDenominator(label.to_string()))?;

        Ok(WindowReturn {
            label: label.to_string(),
            start,
            end,
            starting_value,
            ending_value,
            net_flow,
            weighted_flow,
            flow_count,
            rate,
        })
    }

    /// Measures every window against `current`. A window whose starting
    /// valuation failed, or whose return is undefined, is reported as a
    /// failure; the remaining windows are unaffected.
    pub fn calculate(
        current: &ValuedSnapshot,
        inception: DateTime<Utc>,
        windows: Vec<(LookbackWindow, Result<ValuedSnapshot, Error>)>,
        flows: &[CashFlowEvent],
    ) -> PerformanceReport {
        let end = current.asof;
        let mut returns = Vec::with_capacity(windows.len());
        let mut failures = Vec::new();

        for (window, start_valuation) in windows {
            let outcome = start_valuation
                .map_err(|e| PerformanceError::MissingStartValuation {
                    label: window.label.clone(),
                    reason: e.to_string(),
                })
                .and_then(|start| {
                    Self::modified_dietz(
                        &window.label,
                        window.start,
                        end,
                        start.total_market_value,
                        current.total_market_value,
                        flows,
                    )
                });

            match outcome {
                Ok(window_return) => {
                    debug!(
                        "{}: {} over {} flows",
                        window_return.label, window_return.rate, window_return.flow_count
                    );
                    returns.push(window_return);
                }
                Err(e) => {
                    warn!("Skipping window {}: {}", window.label, e);
                    failures.push(WindowFailure {
                        label: window.label,
                        start: window.start,
                        reason: e.to_string(),
                    });
                }
            }
        }

        PerformanceReport {
            asof: end,
            base_currency: current.base_currency.clone(),
            inception,
            ending_value: current.total_market_value,
            windows: returns,
            failures,
        }
    }
}
