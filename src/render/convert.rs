use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};

use crate::foundation::core::{JPEG_QUALITY, OutputFormat};
use crate::foundation::error::{IoContext as _, ThumbError, ThumbResult};

/// Decode the rasterizer's PNG at `src` and re-encode it as `format` at `dst`.
///
/// Formats without alpha support get the image flattened over `bg_rgba` first. A partially
/// written `dst` is removed when encoding fails.
pub(crate) fn convert_raster(
    src: &Path,
    dst: &Path,
    format: OutputFormat,
    bg_rgba: [u8; 4],
) -> ThumbResult<()> {
    let decoded = image::open(src).map_err(|e| {
        ThumbError::conversion(format!(
            "decode rasterizer output '{}': {e}",
            src.display()
        ))
    })?;
    let rgba = decoded.to_rgba8();

    let file = File::create(dst).io_context(|| format!("create '{}'", dst.display()))?;
    let mut writer = BufWriter::new(file);

    let encoded = match format {
        OutputFormat::Jpg => DynamicImage::ImageRgb8(flatten_over_bg(&rgba, bg_rgba))
            .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)),
        OutputFormat::Webp => DynamicImage::ImageRgba8(rgba)
            .write_with_encoder(WebPEncoder::new_lossless(&mut writer)),
        OutputFormat::Bmp => DynamicImage::ImageRgb8(flatten_over_bg(&rgba, bg_rgba))
            .write_to(&mut writer, format.image_format()),
        OutputFormat::Png => {
            DynamicImage::ImageRgba8(rgba).write_to(&mut writer, format.image_format())
        }
    };

    let result = encoded
        .map_err(|e| {
            ThumbError::conversion(format!("encode {format} '{}': {e}", dst.display()))
        })
        .and_then(|()| {
            writer
                .flush()
                .io_context(|| format!("write '{}'", dst.display()))
        });

    if result.is_err() {
        drop(writer);
        let _ = std::fs::remove_file(dst);
    }
    result
}

/// Composite straight-alpha RGBA8 over an opaque background color.
pub(crate) fn flatten_over_bg(src: &RgbaImage, bg_rgba: [u8; 4]) -> RgbImage {
    let bg = [bg_rgba[0] as u16, bg_rgba[1] as u16, bg_rgba[2] as u16];
    RgbImage::from_fn(src.width(), src.height(), |x, y| {
        let s = src.get_pixel(x, y).0;
        let a = s[3] as u16;
        if a == 255 {
            return image::Rgb([s[0], s[1], s[2]]);
        }
        let inv = 255 - a;
        let mut out = [0u8; 3];
        for (c, o) in out.iter_mut().enumerate() {
            *o = (mul_div255(s[c] as u16, a) + mul_div255(bg[c], inv)).min(255) as u8;
        }
        image::Rgb(out)
    })
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
