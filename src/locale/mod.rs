//! Locale-specific date fields.

mod tables;

use chrono::{Datelike, NaiveDate, Weekday};

use tables::{MONTHS_DE, MONTHS_EN, WEEKDAYS_DE, WEEKDAYS_EN};

/// Human-readable fields of one calendar date in one language.
///
/// Unsupported locales produce empty `month`/`weekday` strings; `year` and `day` are always the
/// date's calendar values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocaleRecord {
    /// Calendar year.
    pub year: i32,
    /// Day of month (1-31).
    pub day: u32,
    /// Localized month name.
    pub month: &'static str,
    /// Localized weekday name.
    pub weekday: &'static str,
}

/// Locales with month and weekday name tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Locale {
    /// `en`
    English,
    /// `de`
    German,
}

impl Locale {
    /// Resolve a locale identifier (`"en"`, `"de"`). Returns `None` for anything else.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "en" => Some(Self::English),
            "de" => Some(Self::German),
            _ => None,
        }
    }

    /// Identifier accepted by [`Locale::parse`].
    pub fn id(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::German => "de",
        }
    }

    fn tables(self) -> (&'static [&'static str; 12], &'static [&'static str; 7]) {
        match self {
            Self::English => (&MONTHS_EN, &WEEKDAYS_EN),
            Self::German => (&MONTHS_DE, &WEEKDAYS_DE),
        }
    }

    /// Build the record for `date` in this locale.
    pub fn record(self, date: NaiveDate) -> LocaleRecord {
        let (months, weekdays) = self.tables();
        LocaleRecord {
            year: date.year(),
            day: date.day(),
            month: months[date.month0() as usize],
            weekday: weekdays[date.weekday().num_days_from_sunday() as usize],
        }
    }
}

/// Build the [`LocaleRecord`] for `date` in the locale named `locale_id`.
///
/// Never fails: an unknown locale yields blank month and weekday names.
pub fn locale_record(date: NaiveDate, locale_id: &str) -> LocaleRecord {
    match Locale::parse(locale_id) {
        Some(locale) => locale.record(date),
        None => LocaleRecord {
            year: date.year(),
            day: date.day(),
            ..LocaleRecord::default()
        },
    }
}

/// English weekday name (`"Monday"`), independent of the display locale.
pub fn english_weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAYS_EN[weekday.num_days_from_sunday() as usize]
}

/// All English weekday names, Sunday first.
pub fn english_weekday_names() -> &'static [&'static str; 7] {
    &WEEKDAYS_EN
}

#[cfg(test)]
#[path = "../../tests/unit/locale/locale.rs"]
mod tests;
