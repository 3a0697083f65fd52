//! Weekday arithmetic for weekly templates.
//!
//! Weekdays are stored as indexes `0..=6` with `0` meaning Sunday, matching the
//! convention used by the tutoring settings UI.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Converts a stored weekday index (0 = Sunday) into a [`Weekday`].
pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Converts a [`Weekday`] into its stored index (0 = Sunday).
pub fn weekday_index(day: Weekday) -> i16 {
    day.num_days_from_sunday() as i16
}

/// Returns every date in `[start, end]` (inclusive) that falls on `weekday`.
///
/// An inverted range yields no dates. Iteration stops at the end of chrono's date range.
pub fn dates_on_weekday(weekday: Weekday, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let offset = (weekday.num_days_from_monday() + 7 - start.weekday().num_days_from_monday()) % 7;

    let mut dates = Vec::new();
    let mut current = start.checked_add_days(Days::new(u64::from(offset)));
    while let Some(date) = current.filter(|date| *date <= end) {
        dates.push(date);
        current = date.checked_add_days(Days::new(7));
    }

    dates
}

/// `date + days`, or `None` when `days` is negative or the result is out of range.
pub fn days_after(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let days = u64::try_from(days).ok()?;
    date.checked_add_days(Days::new(days))
}

