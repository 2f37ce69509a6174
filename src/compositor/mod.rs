//! # Text Compositor
//!
//! Renders caption text onto an image: word-wrapped to a width budget,
//! centered per line, anchored vertically by a [`PlacementPolicy`], with an
//! optional outline or drop shadow.
//!
//! ## Example
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use pixelgenius::compositor::{composite, FontSpec, PlacementPolicy};
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::new(640, 360));
//! let result = composite(
//!     &image,
//!     "Hello world",
//!     &FontSpec::builtin(),
//!     30,
//!     &PlacementPolicy::default(),
//! );
//! assert_eq!(result.lines.len(), 1);
//! assert!(result.fallback.is_none());
//! ```
//!
//! The compositor never fails. A face that cannot be resolved is replaced by
//! the built-in Spleen face and the failure is returned in
//! [`Composite::fallback`].

pub mod builtin;
pub mod font;
pub mod layout;
pub mod placement;
pub mod raster;

pub use font::{Face, FontError, FontSource, FontSpec};
pub use layout::{LayoutLine, wrap_text};
pub use placement::{Color, PlacementPolicy, TextEffect, VerticalAnchor};

use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::{debug, warn};

use crate::canvas::merge_drawn;

/// Smallest accepted pixel size.
pub const MIN_FONT_SIZE: u32 = 10;
/// Largest accepted pixel size.
pub const MAX_FONT_SIZE: u32 = 100;

/// Pixel size used when the caller gives none: 5% of the image height, clamped.
pub fn default_pixel_size(image_height: u32) -> u32 {
    (image_height / 20).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// A layout line with its top-left drawing position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub line: LayoutLine,
    pub x: i32,
    pub y: i32,
}

/// Result of a compositing call.
#[derive(Debug)]
pub struct Composite {
    /// Output image in the input's color mode.
    pub image: DynamicImage,
    pub lines: Vec<PlacedLine>,
    /// Line pitch including the gap; zero when nothing was drawn.
    pub line_height: f32,
    /// Set when the requested face could not be used.
    pub fallback: Option<FontError>,
}

/// Render `text` onto a copy of `image`.
///
/// `pixel_size` is clamped to [`MIN_FONT_SIZE`]..=[`MAX_FONT_SIZE`]. Empty
/// or whitespace-only text returns an unchanged copy.
pub fn composite(
    image: &DynamicImage,
    text: &str,
    font: &FontSpec,
    pixel_size: u32,
    placement: &PlacementPolicy,
) -> Composite {
    if text.trim().is_empty() {
        return Composite {
            image: image.clone(),
            lines: Vec::new(),
            line_height: 0.0,
            fallback: None,
        };
    }

    let size = pixel_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    let (face, fallback) = font.resolve_or_builtin(size);
    if let Some(err) = &fallback {
        warn!(error = %err, "font unavailable, using built-in face");
    }

    let (width, height) = image.dimensions();
    let lines = wrap_text(text, &face, placement.width_budget(width));
    let line_height = face.height() + placement.line_gap as f32;
    let placed = place_lines(lines, width, height, line_height, placement);

    debug!(
        lines = placed.len(),
        size,
        line_height,
        builtin = face.is_builtin(),
        "compositing caption"
    );

    let before = image.to_rgba8();
    let mut canvas = before.clone();
    for line in &placed {
        draw_line(&mut canvas, &face, line, placement);
    }

    Composite {
        image: merge_drawn(image, &before, canvas),
        lines: placed,
        line_height,
        fallback,
    }
}

/// Position wrapped lines: block centered on the anchor, each line centered horizontally.
pub fn place_lines(
    lines: Vec<LayoutLine>,
    image_width: u32,
    image_height: u32,
    line_height: f32,
    placement: &PlacementPolicy,
) -> Vec<PlacedLine> {
    let block_height = lines.len() as f32 * line_height;
    let top = placement.anchor.resolve(image_height) - block_height / 2.0;
    let min_x = placement.side_margin as f32;

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let x = ((image_width as f32 - line.width) / 2.0).max(min_x);
            let y = top + i as f32 * line_height;
            PlacedLine {
                x: x.round() as i32,
                y: y.round() as i32,
                line,
            }
        })
        .collect()
}

fn draw_line(
    canvas: &mut RgbaImage,
    face: &Face,
    placed: &PlacedLine,
    placement: &PlacementPolicy,
) {
    if placed.line.text.is_empty() {
        return;
    }
    let mask = face.rasterize(&placed.line.text);

    if let Some(color) = placement.effect.color() {
        for (dx, dy) in placement.effect.offsets() {
            raster::stamp(canvas, &mask, placed.x + dx, placed.y + dy, color.0);
        }
    }
    raster::stamp(canvas, &mask, placed.x, placed.y, placement.fill.0);
}
