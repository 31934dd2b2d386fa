//! thumbdate renders batches of dated thumbnails from a single SVG template.
//!
//! For every selected date a locale-formatted date string is substituted for a placeholder token
//! in the SVG, the document is rasterized by an external tool (Inkscape's command line by
//! default) and the PNG is optionally re-encoded to another format.
//!
//! # Pipeline overview
//!
//! 1. **Schedule**: `from..=to` filtered by weekday, then custom dates ([`expand`])
//! 2. **Format**: date -> [`LocaleRecord`] -> text via a compiled [`DateTemplate`]
//! 3. **Substitute**: literal placeholder replacement ([`substitute`])
//! 4. **Render**: temp SVG -> rasterizer -> optional conversion ([`ThumbnailRenderer`])
//!
//! [`run_batch`] drives all four stages sequentially and reports per-date failures instead of
//! stopping at the first one.
//!
//! ```no_run
//! use std::path::Path;
//! use thumbdate::{BatchRequest, OutputFormat, Settings, ThumbnailRenderer, run_batch};
//!
//! # fn main() -> thumbdate::ThumbResult<()> {
//! let settings = Settings::load_or_init(&Settings::default_path()?)?;
//! let config = settings.batch_config(settings.load_document()?)?;
//! let renderer = ThumbnailRenderer::with_opts(settings.rasterizer(), settings.render_opts());
//! let request = BatchRequest {
//!     from: "2024-01-01".into(),
//!     to: "2024-03-31".into(),
//!     time: "10:00".into(),
//!     custom_dates: vec!["2024-03-29".into()],
//!     format: OutputFormat::Jpg,
//! };
//! let report = run_batch(&request, &config, &renderer, Path::new("out"))?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod batch;
mod document;
mod foundation;
mod locale;
mod render;
mod schedule;
mod settings;
mod template;

pub use batch::{
    BatchConfig, BatchFailure, BatchReport, BatchRequest, parse_time_of_day, run_batch,
};
pub use document::{TemplateDocument, substitute};
pub use foundation::core::{JPEG_QUALITY, OutputFormat};
pub use foundation::error::{ThumbError, ThumbResult};
pub use locale::{Locale, LocaleRecord, english_weekday_name, english_weekday_names, locale_record};
pub use render::{
    DEFAULT_RASTERIZER_TIMEOUT, ExternalRasterizer, Rasterize, RenderOpts, ThumbnailRenderer,
    ensure_parent_dir, output_file_name,
};
pub use schedule::{
    ISO_DATE, ScheduledDate, WeekdaySet, days_inclusive, expand, parse_iso_date,
};
pub use settings::{FrontendSettings, PathSettings, RenderSettings, Settings};
pub use template::DateTemplate;
