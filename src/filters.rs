//! Brightness, contrast and sharpness adjustment.
//!
//! Each adjustment is an enhancement factor: `1.0` returns the original,
//! lower values move toward a degenerate image, higher values extrapolate
//! away from it. The degenerate images are black (brightness), the mean
//! gray level (contrast) and a smoothed copy (sharpness).

use image::{DynamicImage, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::canvas::restore_color;

/// Lowest accepted enhancement factor.
pub const MIN_FACTOR: f32 = 0.5;
/// Highest accepted enhancement factor.
pub const MAX_FACTOR: f32 = 2.0;

/// 3x3 smoothing kernel used as the sharpness baseline.
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

/// Enhancement factors applied to generated images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }
}

impl Adjustments {
    /// Clamp every factor into [`MIN_FACTOR`]..=[`MAX_FACTOR`].
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(MIN_FACTOR, MAX_FACTOR),
            contrast: self.contrast.clamp(MIN_FACTOR, MAX_FACTOR),
            sharpness: self.sharpness.clamp(MIN_FACTOR, MAX_FACTOR),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0 && self.sharpness == 1.0
    }
}

/// Apply brightness, then contrast, then sharpness.
///
/// The result keeps the input's color mode; identity factors return a clone.
pub fn apply(img: &DynamicImage, adjustments: Adjustments) -> DynamicImage {
    let adjustments = adjustments.clamped();
    if adjustments.is_identity() {
        return img.clone();
    }

    let mut rgba = img.to_rgba8();
    if adjustments.brightness != 1.0 {
        brightness(&mut rgba, adjustments.brightness);
    }
    if adjustments.contrast != 1.0 {
        contrast(&mut rgba, adjustments.contrast);
    }
    if adjustments.sharpness != 1.0 {
        sharpness(&mut rgba, adjustments.sharpness);
    }
    restore_color(rgba, img.color())
}

/// Scale color channels toward black (`factor < 1`) or away from it.
pub fn brightness(rgba: &mut RgbaImage, factor: f32) {
    for pixel in rgba.pixels_mut() {
        for c in 0..3 {
            // Skip alpha channel
            pixel[c] = enhance(0.0, pixel[c] as f32, factor);
        }
    }
}

/// Push channels away from (or toward) the mean gray level.
pub fn contrast(rgba: &mut RgbaImage, factor: f32) {
    let mean = mean_luma(rgba);
    for pixel in rgba.pixels_mut() {
        for c in 0..3 {
            pixel[c] = enhance(mean, pixel[c] as f32, factor);
        }
    }
}

/// Blend with a smoothed copy; border pixels are left untouched.
pub fn sharpness(rgba: &mut RgbaImage, factor: f32) {
    let (width, height) = rgba.dimensions();
    if width < 3 || height < 3 {
        return;
    }
    let smoothed = imageops::filter3x3(&*rgba, &SMOOTH_KERNEL);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let soft = smoothed.get_pixel(x, y).0;
            let pixel = rgba.get_pixel_mut(x, y);
            for c in 0..3 {
                pixel[c] = enhance(soft[c] as f32, pixel[c] as f32, factor);
            }
        }
    }
}

/// `degenerate + factor * (value - degenerate)`, clamped to a channel.
#[inline]
fn enhance(degenerate: f32, value: f32, factor: f32) -> u8 {
    (degenerate + factor * (value - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Mean luminance of the image, rounded to a whole gray level.
fn mean_luma(rgba: &RgbaImage) -> f32 {
    let count = rgba.pixels().len();
    if count == 0 {
        return 0.0;
    }
    let total: f64 = rgba
        .pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .sum();
    (total / count as f64).round() as f32
}
