//! Fixed UTC+9 ("JST") civil-calendar arithmetic.
//!
//! All wall-clock reasoning in the system uses a fixed nine-hour offset
//! applied to stored UTC instants. This is a deliberate constraint, not an
//! approximation: the domain has no DST and no other zones, so every
//! conversion here is total and unambiguous. Downstream code (splitting,
//! payroll, period locks) assumes these functions for every day/month
//! boundary decision.

use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// Offset of the civil calendar from UTC, in hours.
pub const UTC_OFFSET_HOURS: i32 = 9;

/// The fixed +09:00 offset. Infallible: the offset is a compile-time constant
/// well inside chrono's valid range.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_HOURS * 3600).unwrap()
}

/// Converts a JST civil date's midnight back to a UTC instant. Infallible for
/// a fixed offset: local midnight always exists exactly once.
#[allow(clippy::unwrap_used)]
fn civil_midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    jst()
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

/// The JST civil date containing `instant`.
#[must_use]
pub fn civil_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&jst()).date_naive()
}

/// UTC instant of 00:00:00.000 JST on the civil day containing `instant`.
#[must_use]
pub fn civil_day_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    civil_midnight_utc(civil_date(instant))
}

/// UTC instant of 23:59:59.999 JST on the civil day containing `instant`.
#[must_use]
pub fn civil_day_end(instant: DateTime<Utc>) -> DateTime<Utc> {
    civil_day_start(instant) + Duration::days(1) - Duration::milliseconds(1)
}

/// Lazy sequence of civil-day UTC midnights strictly between `a`'s day and
/// `b`'s day. Empty when the days are equal or adjacent.
pub fn civil_days_between_exclusive(
    a: DateTime<Utc>,
    b: DateTime<Utc>,
) -> impl Iterator<Item = DateTime<Utc>> {
    let first = civil_date(a) + Duration::days(1);
    let last = civil_date(b);
    first
        .iter_days()
        .take_while(move |day| *day < last)
        .map(civil_midnight_utc)
}

/// Whether two instants fall on the same JST civil day.
#[must_use]
pub fn is_same_civil_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    civil_date(a) == civil_date(b)
}

/// Whether two instants fall in the same JST civil month.
#[must_use]
pub fn is_same_civil_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    let (da, db) = (civil_date(a), civil_date(b));
    da.year() == db.year() && da.month() == db.month()
}

/// The (year, month) of the JST civil month containing `instant`.
#[must_use]
pub fn civil_year_month(instant: DateTime<Utc>) -> (i32, u32) {
    let date = civil_date(instant);
    (date.year(), date.month())
}

/// UTC instants bounding the given JST month: start is the 1st 00:00:00.000
/// JST, end is the next month's start minus one millisecond.
pub fn civil_month_range(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::Config {
        message: format!("Invalid year/month: {year}-{month}"),
    })?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| Error::Config {
        message: format!("Invalid year/month: {year}-{month}"),
    })?;

    let start = civil_midnight_utc(first);
    let end = civil_midnight_utc(next_first) - Duration::milliseconds(1);
    Ok((start, end))
}

/// Formats an instant as JST wall-clock time for audit notes and messages.
#[must_use]
pub fn format_jst(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&jst())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::jst_instant;

    #[test]
    fn test_civil_day_start_crosses_utc_date() {
        // 2024-01-15 08:00 JST is 2024-01-14 23:00 UTC; the civil day is
        // still the 15th and starts at 2024-01-14 15:00 UTC.
        let instant = jst_instant(2024, 1, 15, 8, 0);
        let start = civil_day_start(instant);
        assert_eq!(start, jst_instant(2024, 1, 15, 0, 0));
        assert_eq!(
            start.with_timezone(&Utc).to_rfc3339(),
            "2024-01-14T15:00:00+00:00"
        );
    }

    #[test]
    fn test_civil_day_end_is_one_ms_before_midnight() {
        let instant = jst_instant(2024, 1, 15, 8, 0);
        let end = civil_day_end(instant);
        assert_eq!(end, jst_instant(2024, 1, 16, 0, 0) - Duration::milliseconds(1));
    }

    #[test]
    fn test_midnight_belongs_to_starting_day() {
        let midnight = jst_instant(2024, 1, 16, 0, 0);
        assert_eq!(civil_day_start(midnight), midnight);
    }

    #[test]
    fn test_days_between_exclusive() {
        let a = jst_instant(2024, 1, 30, 10, 0);
        let b = jst_instant(2024, 2, 2, 9, 0);
        let days: Vec<_> = civil_days_between_exclusive(a, b).collect();
        assert_eq!(
            days,
            vec![jst_instant(2024, 1, 31, 0, 0), jst_instant(2024, 2, 1, 0, 0)]
        );

        // Same day and adjacent days yield nothing
        assert_eq!(civil_days_between_exclusive(a, a).count(), 0);
        let next_day = jst_instant(2024, 1, 31, 3, 0);
        assert_eq!(civil_days_between_exclusive(a, next_day).count(), 0);
    }

    #[test]
    fn test_same_civil_day_straddles_utc_boundary() {
        // 00:30 JST and 23:30 JST of the same civil day are on different
        // UTC dates.
        let early = jst_instant(2024, 3, 10, 0, 30);
        let late = jst_instant(2024, 3, 10, 23, 30);
        assert!(is_same_civil_day(early, late));
        assert_ne!(early.date_naive(), late.date_naive());
    }

    #[test]
    fn test_same_civil_month() {
        let a = jst_instant(2024, 1, 1, 0, 0);
        let b = jst_instant(2024, 1, 31, 23, 59);
        let c = jst_instant(2024, 2, 1, 0, 0);
        assert!(is_same_civil_month(a, b));
        assert!(!is_same_civil_month(b, c));
    }

    #[test]
    fn test_civil_month_range() {
        let (start, end) = civil_month_range(2024, 2).unwrap();
        assert_eq!(start, jst_instant(2024, 2, 1, 0, 0));
        // Leap year: February has 29 days
        assert_eq!(end, jst_instant(2024, 3, 1, 0, 0) - Duration::milliseconds(1));

        let (start, end) = civil_month_range(2024, 12).unwrap();
        assert_eq!(start, jst_instant(2024, 12, 1, 0, 0));
        assert_eq!(end, jst_instant(2025, 1, 1, 0, 0) - Duration::milliseconds(1));

        assert!(civil_month_range(2024, 13).is_err());
    }

    #[test]
    fn test_format_jst() {
        let instant = jst_instant(2024, 1, 15, 9, 30);
        assert_eq!(format_jst(instant), "2024-01-15 09:30:00");
    }
}
