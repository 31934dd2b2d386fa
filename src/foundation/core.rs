use std::fmt;
use std::str::FromStr;

use crate::foundation::error::ThumbError;

/// Raster format of a rendered thumbnail.
///
/// [`OutputFormat::Png`] is what the rasterizer writes natively; every other format goes through
/// a decode/re-encode step after rasterization.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Portable Network Graphics (rasterizer native).
    #[default]
    Png,
    /// JPEG, encoded at [`JPEG_QUALITY`].
    #[serde(alias = "jpeg")]
    Jpg,
    /// Lossless WebP.
    Webp,
    /// Windows bitmap.
    Bmp,
}

/// Fixed quality used for every JPEG thumbnail (1-100).
pub const JPEG_QUALITY: u8 = 95;

impl OutputFormat {
    /// File extension used for output names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
        }
    }

    /// Return `true` when the rasterizer output can be used as-is.
    pub fn is_native(self) -> bool {
        matches!(self, Self::Png)
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ThumbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            other => Err(ThumbError::validation(format!(
                "unsupported output format '{other}' (expected png, jpg, webp or bmp)"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
