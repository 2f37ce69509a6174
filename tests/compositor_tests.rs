//! End-to-end caption compositing tests.
//!
//! Most of these run against the built-in face so results do not depend on
//! the fonts installed on the machine. The outline-face test skips itself
//! when no common system face is installed.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use pixelgenius::compositor::{
    self, Color, FontError, FontSpec, PlacementPolicy, TextEffect, VerticalAnchor,
    font::{find_named_font, system_font_dirs},
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

const HELLO: &str = "Hello world, this is PixelGenius";

fn canvas(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([40, 60, 90])))
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

#[test]
fn test_empty_text_leaves_image_untouched() {
    let img = canvas(320, 200);
    for text in ["", "   ", "\n\n", "\t"] {
        let policy = PlacementPolicy::default();
        let result = compositor::composite(&img, text, &FontSpec::builtin(), 30, &policy);
        assert!(result.lines.is_empty());
        assert_eq!(result.image.as_bytes(), img.as_bytes());
    }
}

#[test]
fn test_words_survive_wrapping_in_order() {
    let img = canvas(300, 400);
    let text = "the quick brown fox jumps over the lazy dog and keeps running far away";
    let policy = PlacementPolicy::default();
    let result = compositor::composite(&img, text, &FontSpec::builtin(), 24, &policy);

    assert!(result.lines.len() > 1);
    let rejoined: Vec<&str> = result
        .lines
        .iter()
        .flat_map(|placed| placed.line.text.split_whitespace())
        .collect();
    assert_eq!(rejoined, words(text));
}

#[test]
fn test_multi_word_lines_fit_width_budget() {
    let img = canvas(400, 600);
    let policy = PlacementPolicy::default();
    let budget = policy.width_budget(400);
    let text = "a few short words that need several lines to fit inside the picture";
    let result = compositor::composite(&img, text, &FontSpec::builtin(), 20, &policy);

    for placed in &result.lines {
        if placed.line.text.contains(' ') {
            assert!(
                placed.line.width <= budget,
                "{:?} is {} wide, budget {}",
                placed.line.text,
                placed.line.width,
                budget
            );
        }
    }
}

#[test]
fn test_oversized_word_gets_own_line() {
    let img = canvas(200, 300);
    let policy = PlacementPolicy::default();
    let result = compositor::composite(
        &img,
        "hi Supercalifragilistic ok",
        &FontSpec::builtin(),
        24,
        &policy,
    );

    let texts: Vec<&str> = result.lines.iter().map(|p| p.line.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "Supercalifragilistic", "ok"]);
    assert!(result.lines[1].line.is_oversized(policy.width_budget(200)));
    // Clamped to the side margin instead of going negative
    assert_eq!(result.lines[1].x, 50);
}

#[test]
fn test_lines_within_budget_are_centered() {
    let img = canvas(800, 600);
    let policy = PlacementPolicy::default();
    let budget = policy.width_budget(800);
    let result = compositor::composite(
        &img,
        "centered lines of differing length\nshort",
        &FontSpec::builtin(),
        30,
        &policy,
    );

    for placed in &result.lines {
        if placed.line.width <= budget {
            let left = placed.x as f32;
            let right = 800.0 - (placed.x as f32 + placed.line.width);
            assert!((left - right).abs() <= 1.0, "{:?}: {} vs {}", placed.line.text, left, right);
        }
    }
}

#[test]
fn test_missing_font_falls_back_to_builtin() {
    let img = canvas(640, 360);
    let font = FontSpec::named("definitely-not-an-installed-face-xyz").with_search_dirs(Vec::new());
    let result = compositor::composite(&img, "still drawn", &font, 30, &PlacementPolicy::default());

    assert!(matches!(result.fallback, Some(FontError::NotFound(_))));
    assert_eq!(result.lines.len(), 1);
    assert_ne!(result.image.as_bytes(), img.as_bytes());
}

#[test]
fn test_hello_example_layout() {
    let img = canvas(640, 360);
    let policy = PlacementPolicy::default();
    assert_eq!(policy.width_budget(640), 540.0);

    let result = compositor::composite(&img, HELLO, &FontSpec::builtin(), 30, &policy);

    let texts: Vec<&str> = result.lines.iter().map(|p| p.line.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello world, this is", "PixelGenius"]);
    assert_eq!(result.line_height, 46.0);

    // Block of two lines centered on the middle anchor
    let top = result.lines[0].y as f32;
    let bottom = result.lines[1].y as f32 + result.line_height;
    let center = (top + bottom) / 2.0;
    assert!((center - 180.0).abs() <= result.line_height);
    assert_eq!(result.lines[0].y, 134);
    assert_eq!(result.lines[1].y, 180);

    // 18px cells: 20 and 11 characters
    assert_eq!(result.lines[0].x, 140);
    assert_eq!(result.lines[1].x, 221);
}

#[test]
fn test_lower_half_anchor_moves_text_down() {
    let img = canvas(640, 360);
    let policy = PlacementPolicy::default();
    let middle = compositor::composite(&img, "caption", &FontSpec::builtin(), 30, &policy);
    let lower = compositor::composite(
        &img,
        "caption",
        &FontSpec::builtin(),
        30,
        &PlacementPolicy::default().with_anchor(VerticalAnchor::LowerHalf),
    );
    assert_eq!(lower.lines[0].y - middle.lines[0].y, 90);
}

#[test]
fn test_shadow_lands_at_offset() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255])));
    let policy = PlacementPolicy::default()
        .with_fill(Color::WHITE)
        .with_effect(TextEffect::Shadow {
            dx: 4,
            dy: 4,
            color: Color::BLACK,
        });
    let result = compositor::composite(&img, "I", &FontSpec::builtin(), 24, &policy);

    // White text on white: only the shadow shows, and only below/right of the glyph box
    let placed = &result.lines[0];
    let dark: Vec<(u32, u32)> = result
        .image
        .pixels()
        .filter(|(_, _, p)| p.0[0] < 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!dark.is_empty());
    assert!(dark.iter().all(|&(x, y)| x as i32 >= placed.x + 4 && y as i32 >= placed.y + 4));
}

#[test]
fn test_color_mode_is_preserved() {
    let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(120, 80, image::Luma([10])));
    let policy = PlacementPolicy::default();
    let result = compositor::composite(&gray, "ok", &FontSpec::builtin(), 20, &policy);
    assert_eq!(result.image.color(), gray.color());
    assert_eq!(result.image.dimensions(), (120, 80));
}

/// Path of a common installed TrueType face, if any.
fn system_font() -> Option<PathBuf> {
    ["DejaVuSans", "LiberationSans-Regular", "Arial", "FreeSans", "NotoSans-Regular"]
        .iter()
        .find_map(|name| find_named_font(name, &system_font_dirs()))
}

#[test]
fn test_outline_face_wraps_centers_and_inks_inside_lines() {
    let Some(path) = system_font() else {
        eprintln!("no system font installed, skipping");
        return;
    };
    let font = FontSpec::file(&path);
    if font.resolve(32).is_err() {
        eprintln!("{} does not load, skipping", path.display());
        return;
    }

    let img = canvas(640, 480);
    let policy = PlacementPolicy::default()
        .with_fill(Color::WHITE)
        .with_effect(TextEffect::None);
    let budget = policy.width_budget(640);
    let text = "sphinx of black quartz, judge my vow while the jolly wizards fly by";
    let result = compositor::composite(&img, text, &font, 32, &policy);

    assert!(result.fallback.is_none(), "{:?}", result.fallback);
    assert!(result.lines.len() > 1);

    let rejoined: Vec<&str> = result
        .lines
        .iter()
        .flat_map(|placed| placed.line.text.split_whitespace())
        .collect();
    assert_eq!(rejoined, words(text));

    for placed in &result.lines {
        if placed.line.text.contains(' ') {
            assert!(placed.line.width <= budget, "{:?} too wide", placed.line.text);
        }
        if placed.line.width <= budget {
            let left = placed.x as f32;
            let right = 640.0 - (placed.x as f32 + placed.line.width);
            assert!((left - right).abs() <= 1.0, "{:?}: {} vs {}", placed.line.text, left, right);
        }
    }

    // Every changed pixel belongs to some line box, allowing for side bearings
    let slack = 8;
    let original = img.to_rgb8();
    let drawn = result.image.to_rgb8();
    let mut changed = 0;
    for (x, y, px) in drawn.enumerate_pixels() {
        if px == original.get_pixel(x, y) {
            continue;
        }
        changed += 1;
        let (x, y) = (x as i32, y as i32);
        let inside = result.lines.iter().any(|placed| {
            let right = placed.x + placed.line.width.ceil() as i32;
            let bottom = placed.y + result.line_height.ceil() as i32;
            x >= placed.x - slack && x <= right + slack && y >= placed.y - slack && y <= bottom
        });
        assert!(inside, "ink at ({}, {}) outside every line box", x, y);
    }
    assert!(changed > 0);
}

#[test]
fn test_sixteen_bit_background_keeps_precision() {
    let background = image::ImageBuffer::from_pixel(200, 100, image::Luma([1000u16]));
    let deep = DynamicImage::ImageLuma16(background);
    let policy = PlacementPolicy::default();
    let result = compositor::composite(&deep, "ok", &FontSpec::builtin(), 20, &policy);

    assert_eq!(result.image.color(), deep.color());
    let out = result.image.to_luma16();
    assert_eq!(out.get_pixel(0, 0).0, [1000]);
    assert_eq!(out.get_pixel(199, 99).0, [1000]);
    assert!(out.pixels().any(|p| p.0[0] != 1000));
}
