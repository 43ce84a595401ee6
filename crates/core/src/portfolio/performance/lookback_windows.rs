//! Standard lookback windows ending now.

use chrono::{DateTime, Utc};

use super::performance_model::LookbackWindow;
use crate::utils::time_utils::{months_before, start_of_year, weeks_before};

pub const SINCE_INCEPTION: &str = "Since Inception";
pub const YEAR_TO_DATE: &str = "YTD";

// Shortest first. Windows stop at the first start on or before inception.
const OFFSET_WINDOWS: [(&str, Offset); 8] = [
    ("1 Week", Offset::Weeks(1)),
    ("1 Month", Offset::Months(1)),
    ("3 Month", Offset::Months(3)),
    ("6 Month", Offset::Months(6)),
    ("1 Year", Offset::Months(12)),
    ("2 Year", Offset::Months(24)),
    ("5 Year", Offset::Months(60)),
    ("10 Year", Offset::Months(120)),
];

#[derive(Debug, Clone, Copy)]
enum Offset {
    Weeks(i64),
    Months(u32),
}

impl Offset {
    fn before(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Offset::Weeks(weeks) => weeks_before(now, weeks),
            Offset::Months(months) => months_before(now, months),
        }
    }
}

/// `Since Inception`, then `YTD` when the year started on or after
/// inception, then the fixed offsets up to the first one that would reach
/// back to or before inception.
pub fn lookback_windows(now: DateTime<Utc>, inception: DateTime<Utc>) -> Vec<LookbackWindow> {
    let mut windows = vec![LookbackWindow::new(SINCE_INCEPTION, inception)];

    let year_start = start_of_year(now);
    if year_start >= inception {
        windows.push(LookbackWindow::new(YEAR_TO_DATE, year_start));
    }

    for (label, offset) in OFFSET_WINDOWS {
        match offset.before(now) {
            Some(start) if start > inception => windows.push(LookbackWindow::new(label, start)),
            _ => break,
        }
    }
    windows
}
