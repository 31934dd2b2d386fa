//! Expansion of a date range plus custom dates into the ordered render schedule.

mod weekdays;

pub use weekdays::WeekdaySet;

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::foundation::error::{ThumbError, ThumbResult};

/// ISO `YYYY-MM-DD` format used for every date in requests and file names.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date; surrounding whitespace is ignored.
pub fn parse_iso_date(raw: &str) -> ThumbResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE)
        .map_err(|e| ThumbError::parse(format!("invalid date '{raw}': {e}")))
}

/// One entry of the render schedule.
#[derive(Debug)]
pub enum ScheduledDate {
    /// A date to render.
    Date(NaiveDate),
    /// A custom date that could not be parsed; recorded as a failure when reached.
    Invalid {
        /// Text as supplied by the caller.
        raw: String,
        /// Why parsing failed.
        error: ThumbError,
    },
}

impl ScheduledDate {
    /// The parsed date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for ScheduledDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format(ISO_DATE)),
            Self::Invalid { raw, .. } => f.write_str(raw),
        }
    }
}

/// Iterate `start..=end` one day at a time. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Build the ordered render schedule.
///
/// Range dates come first, ascending and filtered by `weekdays`. Every custom date follows in
/// input order, unfiltered and not de-duplicated against the range.
pub fn expand<S: AsRef<str>>(
    start: NaiveDate,
    end: NaiveDate,
    weekdays: &WeekdaySet,
    custom_dates: &[S],
) -> Vec<ScheduledDate> {
    let mut out: Vec<ScheduledDate> = days_inclusive(start, end)
        .filter(|d| weekdays.contains(d.weekday()))
        .map(ScheduledDate::Date)
        .collect();

    out.extend(custom_dates.iter().map(|raw| {
        let raw = raw.as_ref();
        match parse_iso_date(raw) {
            Ok(d) => ScheduledDate::Date(d),
            Err(error) => ScheduledDate::Invalid {
                raw: raw.to_owned(),
                error,
            },
        }
    }));

    out
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/schedule.rs"]
mod tests;
