//! crates/event_journal_core/src/period.rs
//!
//! Date-window computation for period summaries and the home-list date
//! filter. All windows are closed intervals anchored to a caller-supplied
//! "now", which keeps the functions pure and testable.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of period a summary covers. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodKind {
    /// Single-character label used in report titles and file names.
    pub fn label(&self) -> &'static str {
        match self {
            PeriodKind::Day => "日",
            PeriodKind::Week => "周",
            PeriodKind::Month => "月",
            PeriodKind::Year => "年",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(PeriodKind::Day),
            "week" => Some(PeriodKind::Week),
            "month" => Some(PeriodKind::Month),
            "year" => Some(PeriodKind::Year),
            _ => None,
        }
    }
}

/// Date filter for the event list: a rolling window rather than the
/// calendar-aligned summary window (`week` here means "the last 7 days").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    Today,
    Week,
    Month,
    Year,
    All,
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of(date: NaiveDate) -> DateTime<Utc> {
    // 23:59:59 is always a valid time of day.
    date.and_hms_opt(23, 59, 59).unwrap().and_utc()
}

/// Computes the `[start, end]` window for a summary period anchored to
/// `now`: `end` is today 23:59:59, `start` is today (day), the preceding
/// Monday (week), the 1st of the month, or January 1st, all at 00:00:00.
pub fn period_window(kind: PeriodKind, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let start_date = match kind {
        PeriodKind::Day => today,
        PeriodKind::Week => {
            let days_to_monday = i64::from(today.weekday().num_days_from_monday());
            today - Duration::days(days_to_monday)
        }
        PeriodKind::Month => today.with_day(1).unwrap(),
        PeriodKind::Year => today.with_day(1).unwrap().with_month(1).unwrap(),
    };
    (start_of(start_date), end_of(today))
}

/// Computes the rolling `[start, end]` window for the home-list date
/// filter. Returns `None` for [`DateFilter::All`].
pub fn rolling_window(
    filter: DateFilter,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let today = now.date_naive();
    let start_date = match filter {
        DateFilter::Today => today,
        DateFilter::Week => today - Duration::days(7),
        DateFilter::Month => today.with_day(1).unwrap(),
        DateFilter::Year => today.with_day(1).unwrap().with_month(1).unwrap(),
        DateFilter::All => return None,
    };
    Some((start_of(start_date), end_of(today)))
}

/// Renders a window as `YYYY/MM/DD - YYYY/MM/DD` for report headers.
pub fn format_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} - {}", start.format("%Y/%m/%d"), end.format("%Y/%m/%d"))
}

/// Renders a single date as `YYYY-MM-DD` for exported file names.
pub fn format_file_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn week_window_from_a_wednesday_starts_preceding_monday() {
        // 2024-06-12 was a Wednesday.
        let now = at(2024, 6, 12, 15);
        let (start, end) = period_window(PeriodKind::Week, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 59).unwrap());
    }

    #[test]
    fn week_window_on_a_monday_starts_that_monday() {
        let now = at(2024, 6, 10, 8);
        let (start, _) = period_window(PeriodKind::Week, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn day_window_covers_exactly_today() {
        let now = at(2024, 6, 12, 15);
        let (start, end) = period_window(PeriodKind::Day, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 59).unwrap());
    }

    #[test]
    fn month_and_year_windows_are_calendar_aligned() {
        let now = at(2024, 6, 12, 15);
        let (month_start, _) = period_window(PeriodKind::Month, now);
        assert_eq!(
            month_start,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        let (year_start, _) = period_window(PeriodKind::Year, now);
        assert_eq!(
            year_start,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rolling_week_is_seven_days_back() {
        let now = at(2024, 6, 12, 15);
        let (start, end) = rolling_window(DateFilter::Week, now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 12, 23, 59, 59).unwrap());
    }

    #[test]
    fn rolling_all_is_unbounded() {
        assert!(rolling_window(DateFilter::All, at(2024, 6, 12, 15)).is_none());
    }

    #[test]
    fn date_range_formatting() {
        let (start, end) = period_window(PeriodKind::Week, at(2024, 6, 12, 15));
        assert_eq!(format_date_range(start, end), "2024/06/10 - 2024/06/12");
    }
}
