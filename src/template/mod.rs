//! Date-format templates.
//!
//! A template is literal text interleaved with `{{field}}` tags, where the field is one of
//! `year`, `day`, `month` or `weekday` (case-insensitive, optional leading `.`), optionally
//! followed by `|filter` steps:
//!
//! - `pad`: zero-pad numeric fields (`day` to 2 digits, `year` to 4)
//! - `short`: last two digits of a number, first three characters of a name
//! - `upper` / `lower`: change the case of a name
//!
//! ```
//! use chrono::NaiveDate;
//! use thumbdate::{DateTemplate, locale_record};
//!
//! let tpl = DateTemplate::compile("{{weekday|short}}, {{day|pad}}. {{month}} {{year}}").unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
//! assert_eq!(tpl.render(&locale_record(date, "de")), "Son, 03. März 2024");
//! ```

mod error;
mod parser;

use std::fmt;

use crate::foundation::error::ThumbResult;
use crate::locale::LocaleRecord;
use parser::{Field, Filter, Segment, parse_template};

/// A compiled date-format template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl DateTemplate {
    /// Compile `format`; syntax errors are reported as [`crate::ThumbError::Compile`].
    pub fn compile(format: &str) -> ThumbResult<Self> {
        let segments = parse_template(format)?;
        Ok(Self {
            source: format.to_owned(),
            segments,
        })
    }

    /// Format string this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template for one date.
    pub fn render(&self, record: &LocaleRecord) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        // Writing into a `String` cannot fail.
        let _ = self.render_to(&mut out, record);
        out
    }

    /// Render the template into any [`fmt::Write`] sink.
    pub fn render_to(&self, out: &mut impl fmt::Write, record: &LocaleRecord) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.write_str(text)?,
                Segment::Field { field, filters } => {
                    out.write_str(&field_value(*field, filters, record))?
                }
            }
        }
        Ok(())
    }
}

fn field_value(field: Field, filters: &[Filter], record: &LocaleRecord) -> String {
    let mut value = match field {
        Field::Year => record.year.to_string(),
        Field::Day => record.day.to_string(),
        Field::Month => record.month.to_owned(),
        Field::Weekday => record.weekday.to_owned(),
    };

    for filter in filters {
        value = match filter {
            Filter::Pad => {
                let width = if field == Field::Year { 4 } else { 2 };
                format!("{value:0>width$}")
            }
            Filter::Short if field.is_numeric() => {
                let skip = value.chars().count().saturating_sub(2);
                value.chars().skip(skip).collect()
            }
            Filter::Short => value.chars().take(3).collect(),
            Filter::Upper => value.to_uppercase(),
            Filter::Lower => value.to_lowercase(),
        };
    }

    value
}

impl fmt::Display for DateTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/template.rs"]
mod tests;
