//! Batch orchestration: schedule -> date text -> substitution -> render, per date.
//!
//! A batch only aborts for request-level problems found before the first render (bad range
//! bounds, bad time of day, unusable output directory or document). Once rendering starts,
//! every per-date failure is recorded and the loop moves on.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};

use crate::document::TemplateDocument;
use crate::foundation::core::OutputFormat;
use crate::foundation::error::{IoContext as _, ThumbError, ThumbResult};
use crate::locale::{Locale, locale_record};
use crate::render::{Rasterize, ThumbnailRenderer, output_file_name};
use crate::schedule::{ISO_DATE, ScheduledDate, WeekdaySet, expand, parse_iso_date};
use crate::template::DateTemplate;

/// One batch invocation as submitted by a caller.
///
/// JSON shape: `{"from": "2024-01-01", "to": "2024-01-31", "time": "10:00",
/// "customDates": ["2024-02-03"], "type": "jpg"}`. `customDates` and `type` are optional.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// First date of the range (`YYYY-MM-DD`, inclusive).
    pub from: String,
    /// Last date of the range (`YYYY-MM-DD`, inclusive).
    pub to: String,
    /// Time of day (`HH:MM` or `HH:MM:SS`), used only in output file names.
    pub time: String,
    /// Extra dates rendered after the range regardless of weekday.
    #[serde(default)]
    pub custom_dates: Vec<String>,
    /// Output raster format.
    #[serde(rename = "type", default)]
    pub format: OutputFormat,
}

/// Everything a batch reads besides the request. Passed explicitly on every run.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Locale id for month and weekday names.
    pub locale: String,
    /// Weekdays kept from the range.
    pub weekdays: WeekdaySet,
    /// Compiled date-format template.
    pub template: DateTemplate,
    /// SVG template and placeholder token.
    pub document: TemplateDocument,
}

impl BatchConfig {
    /// Formatted date text for `date`.
    pub fn date_text(&self, date: NaiveDate) -> String {
        self.template.render(&locale_record(date, &self.locale))
    }

    /// The template document with the date text for `date` substituted in.
    pub fn document_for(&self, date: NaiveDate) -> String {
        self.document.render_for(&self.date_text(date)).into_owned()
    }
}

/// A date that did not produce a thumbnail.
#[derive(Debug)]
pub struct BatchFailure {
    /// ISO date, or the raw text of a custom date that failed to parse.
    pub label: String,
    /// Parsed date, when parsing succeeded.
    pub date: Option<NaiveDate>,
    /// What went wrong.
    pub error: ThumbError,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.error)
    }
}

/// Outcome of a batch: successes plus attributed failures.
///
/// `succeeded + failures.len()` always equals the number of scheduled entries.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of thumbnails written.
    pub succeeded: usize,
    /// Failures in schedule order.
    pub failures: Vec<BatchFailure>,
    /// Paths written, in schedule order.
    pub outputs: Vec<PathBuf>,
}

impl BatchReport {
    /// Number of scheduled entries processed.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Return `true` when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed",
            self.succeeded,
            self.failures.len()
        )
    }
}

/// Validate a time of day (`HH:MM` or `HH:MM:SS`) and return it trimmed.
pub fn parse_time_of_day(raw: &str) -> ThumbResult<&str> {
    let time = raw.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|e| ThumbError::parse(format!("invalid time '{raw}': {e}")))?;
    Ok(time)
}

/// Run one batch and write thumbnails into `out_dir`.
///
/// Returns `Err` only when the request is unusable before anything is rendered; per-date
/// failures end up in [`BatchReport::failures`].
#[tracing::instrument(
    skip(request, config, renderer, out_dir),
    fields(from = %request.from, to = %request.to, format = %request.format)
)]
pub fn run_batch<R: Rasterize>(
    request: &BatchRequest,
    config: &BatchConfig,
    renderer: &ThumbnailRenderer<R>,
    out_dir: &Path,
) -> ThumbResult<BatchReport> {
    let start = parse_iso_date(&request.from)?;
    let end = parse_iso_date(&request.to)?;
    let time = parse_time_of_day(&request.time)?;
    config.document.validate()?;

    if Locale::parse(&config.locale).is_none() {
        tracing::warn!(
            locale = %config.locale,
            "unsupported locale; month and weekday names will be blank"
        );
    }
    for name in config.weekdays.unknown_names() {
        tracing::warn!(name, "selected weekday is not an English weekday name and never matches");
    }
    if config.document.placeholder_count() == 0 {
        tracing::warn!(
            placeholder = config.document.placeholder(),
            "placeholder does not occur in the template document"
        );
    }

    std::fs::create_dir_all(out_dir).io_context(|| {
        format!("failed to create output directory '{}'", out_dir.display())
    })?;

    let schedule = expand(start, end, &config.weekdays, &request.custom_dates);
    tracing::info!(dates = schedule.len(), "starting batch");

    let mut report = BatchReport::default();
    for entry in schedule {
        let date = match entry {
            ScheduledDate::Date(date) => date,
            ScheduledDate::Invalid { raw, error } => {
                tracing::warn!(date = %raw, "skipping custom date: {error}");
                report.failures.push(BatchFailure {
                    label: raw,
                    date: None,
                    error,
                });
                continue;
            }
        };

        let label = date.format(ISO_DATE).to_string();
        let out_path = out_dir.join(output_file_name(date, time, request.format));
        let document = config.document_for(date);

        match renderer.render(&document, &out_path, request.format) {
            Ok(()) => {
                tracing::debug!(date = %label, path = %out_path.display(), "rendered thumbnail");
                report.succeeded += 1;
                report.outputs.push(out_path);
            }
            Err(error) => {
                tracing::warn!(date = %label, "thumbnail failed: {error}");
                report.failures.push(BatchFailure {
                    label,
                    date: Some(date),
                    error,
                });
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/batch.rs"]
mod tests;
