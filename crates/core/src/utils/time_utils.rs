use chrono::{Datelike, Duration, NaiveDate};

/// Calendar days from `start` to `end`; negative when `end` is earlier.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Adds a whole number of days, saturating at the calendar bounds.
pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// `YYYY-MM` key used for monthly breakdowns.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Days left until `maturity`; zero on or after the maturity date.
pub fn days_until(as_of: NaiveDate, maturity: NaiveDate) -> i64 {
    days_between(as_of, maturity).max(0)
}
