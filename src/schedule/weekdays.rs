use std::collections::{BTreeMap, BTreeSet};

use chrono::Weekday;

use crate::locale::{english_weekday_name, english_weekday_names};

/// Weekdays selected for rendering, keyed by English weekday name.
///
/// Membership is an exact, case-sensitive match against `"Monday"` .. `"Sunday"`. Names outside
/// that set are kept (so settings round-trip unchanged) but can never match a date.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct WeekdaySet {
    names: BTreeSet<String>,
}

impl WeekdaySet {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection containing every weekday.
    pub fn all() -> Self {
        english_weekday_names().iter().copied().collect()
    }

    /// Add a weekday by name.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Return `true` when `weekday` is selected.
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.names.contains(english_weekday_name(weekday))
    }

    /// Return `true` when no name is selected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Selected names that are not English weekday names.
    pub fn unknown_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|n| !english_weekday_names().contains(n))
    }

    /// Iterate over the selected names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum WeekdaySetRepr {
    Names(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

impl<'de> serde::Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WeekdaySetRepr::deserialize(deserializer)? {
            WeekdaySetRepr::Names(names) => names.into_iter().collect(),
            WeekdaySetRepr::Flags(flags) => flags
                .into_iter()
                .filter_map(|(name, on)| on.then_some(name))
                .collect(),
        })
    }
}
