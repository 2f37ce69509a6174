//! Image decoding, encoding and color-mode round trips.

use image::{ColorType, DynamicImage, ImageBuffer, Pixel, RgbaImage, imageops::FilterType};
use std::io::Cursor;

use crate::error::PixelError;

/// Display size used for previews.
pub const PREVIEW_WIDTH: u32 = 640;
pub const PREVIEW_HEIGHT: u32 = 360;

/// Convert a working RGBA buffer back to the caller's color mode.
pub fn restore_color(canvas: RgbaImage, color: ColorType) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(canvas);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(rgba.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(rgba.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(rgba.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(rgba.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(rgba.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(rgba.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(rgba.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(rgba.to_rgba32f()),
        _ => rgba,
    }
}

/// Merge an 8-bit drawing back into `original`, keeping its color mode.
///
/// `before` is `original` as the RGBA buffer the drawing started from. For
/// 16-bit and float images only pixels that differ from `before` are taken
/// from `drawn`; every other pixel keeps its full precision.
pub fn merge_drawn(original: &DynamicImage, before: &RgbaImage, drawn: RgbaImage) -> DynamicImage {
    let color = original.color();
    if matches!(color, ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8) {
        return restore_color(drawn, color);
    }

    let changed: Vec<bool> = before
        .pixels()
        .zip(drawn.pixels())
        .map(|(a, b)| a != b)
        .collect();
    let drawn = DynamicImage::ImageRgba8(drawn);
    match color {
        ColorType::L16 => DynamicImage::ImageLuma16(overlay_changed(
            original.to_luma16(),
            &drawn.to_luma16(),
            &changed,
        )),
        ColorType::La16 => DynamicImage::ImageLumaA16(overlay_changed(
            original.to_luma_alpha16(),
            &drawn.to_luma_alpha16(),
            &changed,
        )),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(overlay_changed(
            original.to_rgb16(),
            &drawn.to_rgb16(),
            &changed,
        )),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(overlay_changed(
            original.to_rgba16(),
            &drawn.to_rgba16(),
            &changed,
        )),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(overlay_changed(
            original.to_rgb32f(),
            &drawn.to_rgb32f(),
            &changed,
        )),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(overlay_changed(
            original.to_rgba32f(),
            &drawn.to_rgba32f(),
            &changed,
        )),
        _ => drawn,
    }
}

/// Copy pixels flagged in `changed` from `drawn` onto `base`.
fn overlay_changed<P: Pixel>(
    mut base: ImageBuffer<P, Vec<P::Subpixel>>,
    drawn: &ImageBuffer<P, Vec<P::Subpixel>>,
    changed: &[bool],
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    for ((dst, src), &hit) in base.pixels_mut().zip(drawn.pixels()).zip(changed) {
        if hit {
            *dst = *src;
        }
    }
    base
}

/// Encode an image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, PixelError> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| PixelError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

/// Decode uploaded bytes (HEIC/HEIF too when built with the `heif` feature).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PixelError> {
    #[cfg(feature = "heif")]
    if is_heic(bytes) {
        return decode_heic(bytes)
            .map_err(|e| PixelError::Image(format!("Failed to decode HEIC: {}", e)));
    }

    image::load_from_memory(bytes)
        .map_err(|e| PixelError::Image(format!("Failed to decode image: {}", e)))
}

/// Resize to the fixed preview size shown next to results.
pub fn preview(img: &DynamicImage) -> DynamicImage {
    img.resize_exact(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Triangle)
}

/// Check if the data looks like a HEIC/HEIF file by examining magic bytes.
/// HEIC files have an "ftyp" box near the start with HEIC-related brand codes.
#[cfg(feature = "heif")]
fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &data[8..12],
        b"heic"
            | b"heix"
            | b"hevc"
            | b"hevx"
            | b"heim"
            | b"heis"
            | b"hevm"
            | b"hevs"
            | b"mif1"
            | b"msf1"
    )
}

#[cfg(feature = "heif")]
fn decode_heic(data: &[u8]) -> Result<DynamicImage, String> {
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx =
        HeifContext::read_from_bytes(data).map_err(|e| format!("Failed to read HEIC: {}", e))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| format!("Failed to get primary image: {}", e))?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| format!("Failed to decode HEIC image: {}", e))?;

    let planes = image.planes();
    let interleaved = planes.interleaved.ok_or("No interleaved RGB data in HEIC")?;
    let (width, height) = (image.width(), image.height());
    let stride = interleaved.stride;

    let mut rgb_image = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let offset = (y as usize * stride) + (x as usize * 3);
            if offset + 2 < interleaved.data.len() {
                let px = &interleaved.data[offset..offset + 3];
                rgb_image.put_pixel(x, y, image::Rgb([px[0], px[1], px[2]]));
            }
        }
    }

    Ok(DynamicImage::ImageRgb8(rgb_image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_restore_keeps_color_mode() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([77])));
        let restored = restore_color(gray.to_rgba8(), gray.color());
        assert_eq!(restored.color(), ColorType::L8);
        assert_eq!(restored.as_bytes(), gray.as_bytes());

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        let restored = restore_color(rgb.to_rgba8(), rgb.color());
        assert_eq!(restored.color(), ColorType::Rgb8);
        assert_eq!(restored.as_bytes(), rgb.as_bytes());
    }

    #[test]
    fn test_merge_keeps_untouched_16_bit_pixels() {
        let pixel = Rgb([1000u16, 30000, 65000]);
        let deep = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(4, 1, pixel));
        let before = deep.to_rgba8();
        let mut drawn = before.clone();
        drawn.put_pixel(2, 0, image::Rgba([255, 0, 0, 255]));

        let merged = merge_drawn(&deep, &before, drawn).to_rgb16();
        assert_eq!(merged.get_pixel(0, 0).0, [1000, 30000, 65000]);
        assert_eq!(merged.get_pixel(3, 0).0, [1000, 30000, 65000]);
        assert_eq!(merged.get_pixel(2, 0).0, [65535, 0, 0]);
    }

    #[test]
    fn test_merge_keeps_untouched_float_pixels() {
        let pixel = image::Rgba([0.123f32, 0.5, 0.987, 1.0]);
        let deep = DynamicImage::ImageRgba32F(ImageBuffer::from_pixel(2, 2, pixel));
        let before = deep.to_rgba8();
        let merged = merge_drawn(&deep, &before, before.clone());
        assert_eq!(merged.color(), ColorType::Rgba32F);
        assert_eq!(merged.as_bytes(), deep.as_bytes());
    }

    #[test]
    fn test_png_round_trip() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 4, Rgb([10, 20, 30])));
        let bytes = encode_png(&img).unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(PixelError::Image(_))));
    }

    #[test]
    fn test_preview_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1024, 1024));
        let small = preview(&img);
        assert_eq!((small.width(), small.height()), (PREVIEW_WIDTH, PREVIEW_HEIGHT));
    }
}
