//! Built-in bitmap face.
//!
//! Uses the Spleen bitmap font family so captions always render, even on a
//! host with no usable TrueType fonts. Glyphs come from the 6×12 cut scaled by
//! an integer factor; when the factor is even the 12×24 cut is used instead,
//! which has identical metrics and sharper shapes.

use spleen_font::{FONT_6X12, FONT_12X24, PSF2Font};

use super::raster::CoverageMask;

const BASE_WIDTH: usize = 6;
const BASE_HEIGHT: usize = 12;

/// Spleen face scaled to a pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFace {
    scale: usize,
}

impl BuiltinFace {
    /// Pick the smallest integer scale whose cells are at least `pixel_size` tall.
    pub fn new(pixel_size: u32) -> Self {
        let scale = (pixel_size as usize).div_ceil(BASE_HEIGHT).max(1);
        Self { scale }
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn cell_width(&self) -> usize {
        BASE_WIDTH * self.scale
    }

    pub fn cell_height(&self) -> usize {
        BASE_HEIGHT * self.scale
    }

    /// Monospaced advance: every character occupies one cell.
    pub fn measure(&self, text: &str) -> f32 {
        (text.chars().count() * self.cell_width()) as f32
    }

    pub fn rasterize(&self, text: &str) -> CoverageMask {
        let cell_w = self.cell_width();
        let cell_h = self.cell_height();
        let mut mask = CoverageMask::new(text.chars().count() * cell_w, cell_h);

        // Even scales draw from the 12x24 cut at half the factor
        let (data, src_w, src_h, factor): (&[u8], usize, usize, usize) = if self.scale % 2 == 0 {
            (FONT_12X24, BASE_WIDTH * 2, BASE_HEIGHT * 2, self.scale / 2)
        } else {
            (FONT_6X12, BASE_WIDTH, BASE_HEIGHT, self.scale)
        };

        let mut spleen = PSF2Font::new(data).ok();

        for (i, ch) in text.chars().enumerate() {
            let origin_x = i * cell_w;
            let mut bitmap = vec![0u8; src_w * src_h];
            let utf8_bytes = ch.to_string();

            let found = match spleen.as_mut() {
                Some(font) => match font.glyph_for_utf8(utf8_bytes.as_bytes()) {
                    Some(glyph) => {
                        for (row_y, row) in glyph.enumerate() {
                            for (col_x, on) in row.enumerate() {
                                if row_y < src_h && col_x < src_w && on {
                                    bitmap[row_y * src_w + col_x] = 1;
                                }
                            }
                        }
                        true
                    }
                    None => false,
                },
                None => false,
            };

            if !found && !ch.is_whitespace() {
                draw_box(&mut bitmap, src_w, src_h);
            }

            blit_scaled(&mut mask, &bitmap, src_w, src_h, origin_x, factor);
        }

        mask
    }
}

/// Copy a 1-bit bitmap into the mask, replicating each pixel `factor`×`factor`.
fn blit_scaled(
    mask: &mut CoverageMask,
    bitmap: &[u8],
    src_w: usize,
    src_h: usize,
    origin_x: usize,
    factor: usize,
) {
    for sy in 0..src_h {
        for sx in 0..src_w {
            if bitmap[sy * src_w + sx] == 0 {
                continue;
            }
            for dy in 0..factor {
                for dx in 0..factor {
                    let x = origin_x + sx * factor + dx;
                    let y = sy * factor + dy;
                    mask.add(x as i32, y as i32, 1.0);
                }
            }
        }
    }
}

/// Draw a box outline for characters the font does not cover.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    // Inset by one pixel so adjacent boxes stay distinguishable
    let (left, right) = (1, width - 2);
    let (top, bottom) = (1, height - 2);
    for x in left..=right {
        glyph[top * width + x] = 1;
        glyph[bottom * width + x] = 1;
    }
    for y in top..=bottom {
        glyph[y * width + left] = 1;
        glyph[y * width + right] = 1;
    }
}
