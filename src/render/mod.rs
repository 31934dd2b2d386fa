//! SVG-to-raster rendering of a single thumbnail.
//!
//! Every render works inside its own temporary directory: the substituted SVG and, for
//! non-PNG output, the intermediate PNG live there and are removed together when the render
//! returns, whatever the outcome.

mod convert;
mod rasterizer;

pub use rasterizer::{DEFAULT_RASTERIZER_TIMEOUT, ExternalRasterizer, Rasterize};

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::foundation::core::OutputFormat;
use crate::foundation::error::{IoContext as _, ThumbResult};
use crate::schedule::ISO_DATE;
use convert::convert_raster;

const TEMP_PREFIX: &str = "thumbdate.";
const DOCUMENT_FILE: &str = "document.svg";
const RASTER_FILE: &str = "raster.png";

/// Deterministic thumbnail file name: `<YYYY-MM-DD>.<HH-MM>.<ext>`.
///
/// Colons in `time` become dashes, so rendering the same date and time twice overwrites the
/// earlier file.
pub fn output_file_name(date: NaiveDate, time: &str, format: OutputFormat) -> String {
    format!(
        "{}.{}.{}",
        date.format(ISO_DATE),
        time.replace(':', "-"),
        format.extension()
    )
}

/// Options for [`ThumbnailRenderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOpts {
    /// Background used to flatten alpha for formats without transparency (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Parent directory for per-render temp directories; the system temp dir when `None`.
    pub temp_root: Option<PathBuf>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
            temp_root: None,
        }
    }
}

/// Renders substituted SVG documents to raster files through a [`Rasterize`] implementation.
#[derive(Clone, Debug)]
pub struct ThumbnailRenderer<R = ExternalRasterizer> {
    rasterizer: R,
    opts: RenderOpts,
}

impl<R: Rasterize> ThumbnailRenderer<R> {
    /// Create a renderer with default options.
    pub fn new(rasterizer: R) -> Self {
        Self::with_opts(rasterizer, RenderOpts::default())
    }

    /// Create a renderer with explicit options.
    pub fn with_opts(rasterizer: R, opts: RenderOpts) -> Self {
        Self { rasterizer, opts }
    }

    /// Borrow the rasterizer.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Borrow the options.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Render `document` into `output_path` as `format`.
    ///
    /// Errors: [`crate::ThumbError::Io`] for temp/output files, [`crate::ThumbError::Renderer`]
    /// when the rasterizer fails, [`crate::ThumbError::Conversion`] when re-encoding fails.
    pub fn render(
        &self,
        document: &str,
        output_path: &Path,
        format: OutputFormat,
    ) -> ThumbResult<()> {
        ensure_parent_dir(output_path)?;

        let scratch = self.scratch_dir()?;
        let svg_path = scratch.path().join(DOCUMENT_FILE);
        std::fs::write(&svg_path, document)
            .io_context(|| format!("write '{}'", svg_path.display()))?;

        let result = if format.is_native() {
            self.rasterizer.rasterize(&svg_path, output_path)
        } else {
            let raster_path = scratch.path().join(RASTER_FILE);
            self.rasterizer
                .rasterize(&svg_path, &raster_path)
                .and_then(|()| convert_raster(&raster_path, output_path, format, self.opts.bg_rgba))
        };

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::warn!(
                path = %scratch_path.display(),
                "failed to remove render scratch directory: {e}"
            );
        }

        result
    }

    fn scratch_dir(&self) -> ThumbResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        let scratch = match &self.opts.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        scratch.io_context(|| "create render scratch directory")
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ThumbResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).io_context(|| {
            format!("failed to create output directory '{}'", parent.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/render.rs"]
mod tests;
