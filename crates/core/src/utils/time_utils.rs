use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone the brokerage export is stamped in.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::America::Toronto;

/// Calendar date of `instant` in the account's timezone. Trade dates, oracle
/// lookup dates and window valuation dates all go through here.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Midnight UTC on January 1st of the instant's year.
pub fn start_of_year(instant: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(instant.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(instant)
}

/// Subtracts calendar months, clamping to the last valid day of the target month.
/// Returns `None` when the result is out of chrono's range.
pub fn months_before(instant: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    instant.checked_sub_months(Months::new(months))
}

pub fn weeks_before(instant: DateTime<Utc>, weeks: i64) -> Option<DateTime<Utc>> {
    instant.checked_sub_signed(Duration::weeks(weeks))
}

/// The day before `date`, used when an oracle lookup steps back over a gap.
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}
