//! Operator settings persisted as JSON between runs.
//!
//! The pipeline never reads these directly: [`Settings::batch_config`] takes a snapshot that is
//! handed to [`crate::run_batch`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::BatchConfig;
use crate::document::TemplateDocument;
use crate::foundation::error::{IoContext as _, ThumbError, ThumbResult};
use crate::render::{DEFAULT_RASTERIZER_TIMEOUT, ExternalRasterizer, RenderOpts};
use crate::schedule::WeekdaySet;
use crate::template::DateTemplate;

const APP_DIR: &str = "thumbdate";
const SETTINGS_FILE: &str = "settings.json";

/// User-facing choices: language, weekdays, placeholder and date format.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrontendSettings {
    /// Locale id (`en`, `de`).
    pub locale: String,
    /// Weekdays rendered from a range.
    pub days: WeekdaySet,
    /// Placeholder token replaced in the SVG.
    pub replacement_key: String,
    /// Date-format template source.
    pub date_format: String,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            locale: "en".to_owned(),
            days: ["Sunday"].into_iter().collect(),
            replacement_key: "SUNDAY_DATE".to_owned(),
            date_format: "{{day}}. {{month}} {{year}}".to_owned(),
        }
    }
}

/// Last-used locations and the rasterizer executable.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Last opened SVG template.
    pub svg: Option<PathBuf>,
    /// Last export directory.
    pub export: Option<PathBuf>,
    /// Rasterizer executable (looked up on `PATH` when not absolute).
    pub rasterizer: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            svg: None,
            export: None,
            rasterizer: PathBuf::from("inkscape"),
        }
    }
}

/// Rasterizer and conversion knobs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Per-invocation rasterizer timeout in seconds; `0` disables the timeout.
    pub rasterizer_timeout_secs: u64,
    /// Background for formats without alpha (RGBA8).
    pub background: [u8; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            rasterizer_timeout_secs: DEFAULT_RASTERIZER_TIMEOUT.as_secs(),
            background: RenderOpts::default().bg_rgba,
        }
    }
}

/// Everything persisted between runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// User-facing choices.
    pub frontend: FrontendSettings,
    /// Remembered paths.
    pub paths: PathSettings,
    /// Rendering knobs.
    pub render: RenderSettings,
}

impl Settings {
    /// `<config dir>/thumbdate/settings.json`.
    pub fn default_path() -> ThumbResult<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            ThumbError::validation("could not determine the user config directory")
        })?;
        Ok(base.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from `path`, writing the defaults there first when it does not exist.
    pub fn load_or_init(path: &Path) -> ThumbResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path)?;
            tracing::info!(path = %path.display(), "wrote default settings");
            return Ok(settings);
        }
        Self::load(path)
    }

    /// Load settings from `path`.
    ///
    /// A stored date format that does not compile is kept as-is so it can be replaced with
    /// [`Settings::apply_frontend`]; [`Settings::batch_config`] reports it.
    pub fn load(path: &Path) -> ThumbResult<Self> {
        let raw = std::fs::read_to_string(path)
            .io_context(|| format!("read settings '{}'", path.display()))?;
        let settings: Self = serde_json::from_str(&raw).map_err(|e| {
            ThumbError::validation(format!("parse settings '{}': {e}", path.display()))
        })?;
        if let Err(e) = settings.compile_template() {
            tracing::warn!(path = %path.display(), "stored date format is unusable: {e}");
        }
        Ok(settings)
    }

    /// Write settings to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ThumbResult<()> {
        crate::render::ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ThumbError::validation(format!("serialize settings: {e}")))?;
        std::fs::write(path, json)
            .io_context(|| format!("write settings '{}'", path.display()))
    }

    /// Compile the configured date format.
    pub fn compile_template(&self) -> ThumbResult<DateTemplate> {
        DateTemplate::compile(&self.frontend.date_format)
    }

    /// Replace the user-facing settings and return the recompiled date template.
    ///
    /// Nothing changes when the new format does not compile.
    pub fn apply_frontend(&mut self, frontend: FrontendSettings) -> ThumbResult<DateTemplate> {
        let template = DateTemplate::compile(&frontend.date_format)?;
        self.frontend = frontend;
        Ok(template)
    }

    /// Rasterizer timeout, `None` when disabled.
    pub fn rasterizer_timeout(&self) -> Option<Duration> {
        match self.render.rasterizer_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Rasterizer described by these settings.
    pub fn rasterizer(&self) -> ExternalRasterizer {
        ExternalRasterizer::new(&self.paths.rasterizer).with_timeout(self.rasterizer_timeout())
    }

    /// Renderer options described by these settings.
    pub fn render_opts(&self) -> RenderOpts {
        RenderOpts {
            bg_rgba: self.render.background,
            ..RenderOpts::default()
        }
    }

    /// Load the last selected SVG template.
    pub fn load_document(&self) -> ThumbResult<TemplateDocument> {
        let path = self
            .paths
            .svg
            .as_deref()
            .ok_or_else(|| ThumbError::validation("no SVG template selected"))?;
        TemplateDocument::load(path, self.frontend.replacement_key.clone())
    }

    /// Snapshot these settings into a [`BatchConfig`] for `document`.
    pub fn batch_config(&self, document: TemplateDocument) -> ThumbResult<BatchConfig> {
        Ok(BatchConfig {
            locale: self.frontend.locale.clone(),
            weekdays: self.frontend.days.clone(),
            template: self.compile_template()?,
            document,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/settings.rs"]
mod tests;
