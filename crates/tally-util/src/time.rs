//! Business-date helpers for tallyd
//!
//! Sessions are keyed by calendar date with no time component; the wire
//! format is always `YYYY-MM-DD`. Wall-clock timestamps (sync log,
//! closed-at markers) use `DateTime<Local>` in RFC 3339.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};

use crate::TallyError;

/// Wire format for business dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Get today's business date.
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Parse a `YYYY-MM-DD` business date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TallyError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| TallyError::invalid_date(format!("expected YYYY-MM-DD, got '{}'", s)))
}

/// Format a business date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The Monday-to-Sunday week containing `date`.
pub fn week_of(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

/// First and last day of the given month, if the month is valid.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first - Duration::days(1)))
}

/// Parse a `YYYY-MM` month specifier into its first and last day.
pub fn parse_month(s: &str) -> Result<(NaiveDate, NaiveDate), TallyError> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| TallyError::invalid_date(format!("expected YYYY-MM, got '{}'", s)))?;
    let year: i32 = year
        .parse()
        .map_err(|_| TallyError::invalid_date(format!("invalid year in '{}'", s)))?;
    let month: u32 = month
        .parse()
        .map_err(|_| TallyError::invalid_date(format!("invalid month in '{}'", s)))?;
    month_bounds(year, month)
        .ok_or_else(|| TallyError::invalid_date(format!("no such month: '{}'", s)))
}
