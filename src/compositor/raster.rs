//! Coverage masks and alpha blending.
//!
//! Each layout line is rasterized once into an anti-aliased coverage mask;
//! outline, shadow and fill passes then stamp that mask onto the canvas at
//! different offsets and colors.

use image::{Rgba, RgbaImage};

/// Rasterized text as a coverage buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    pub width: usize,
    pub height: usize,
    /// Position of column 0 relative to the line origin; negative when ink
    /// overhangs the left edge of the first glyph.
    pub left: i32,
    /// Position of row 0 relative to the line top.
    pub top: i32,
    /// Coverage values: 0.0 = empty, 1.0 = fully inked, with intermediate for anti-aliasing.
    pub data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_origin(width, height, 0, 0)
    }

    /// A mask whose top-left corner sits at `(left, top)` relative to the line origin.
    pub fn with_origin(width: usize, height: usize, left: i32, top: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            left,
            top,
            data: vec![0.0; width * height],
        }
    }

    /// Accumulate coverage at a pixel, ignoring anything outside the mask.
    pub fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = y as usize * self.width + x as usize;
            self.data[idx] = (self.data[idx] + coverage).min(1.0);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v <= 0.0)
    }
}

/// Stamp a mask onto the canvas with its line origin at `(x, y)`.
///
/// Pixels falling outside the canvas are clipped.
pub fn stamp(canvas: &mut RgbaImage, mask: &CoverageMask, x: i32, y: i32, color: Rgba<u8>) {
    let (canvas_w, canvas_h) = (canvas.width() as i32, canvas.height() as i32);
    let (x, y) = (x + mask.left, y + mask.top);

    for my in 0..mask.height {
        let cy = y + my as i32;
        if cy < 0 || cy >= canvas_h {
            continue;
        }
        for mx in 0..mask.width {
            let cx = x + mx as i32;
            if cx < 0 || cx >= canvas_w {
                continue;
            }
            let coverage = mask.get(mx, my);
            if coverage <= 0.0 {
                continue;
            }
            blend(canvas.get_pixel_mut(cx as u32, cy as u32), color, coverage);
        }
    }
}

/// Source-over blend of `color` scaled by `coverage` onto `dst`.
fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let src_a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    for c in 0..3 {
        let src = color[c] as f32;
        let below = dst[c] as f32;
        let value = (src * src_a + below * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
