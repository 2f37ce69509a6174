//! Placement policy: width budget, vertical anchor, colors and text effects.

use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default horizontal margin on each side of the caption, in pixels.
pub const DEFAULT_SIDE_MARGIN: u32 = 50;

/// Default gap between consecutive lines, in pixels.
pub const DEFAULT_LINE_GAP: u32 = 10;

/// Largest accepted outline radius; each line is stamped (2r+1)²−1 times.
pub const MAX_OUTLINE_RADIUS: u32 = 10;

/// An RGBA color parsed from `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub Rgba<u8>);

impl Color {
    pub const WHITE: Color = Color(Rgba([255, 255, 255, 255]));
    pub const BLACK: Color = Color(Rgba([0, 0, 0, 255]));
    /// Semi-transparent black used for drop shadows.
    pub const SHADOW: Color = Color(Rgba([0, 0, 0, 128]));

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(Rgba([r, g, b, a]))
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let named = match value.as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            "red" => Some(Color::rgba(255, 0, 0, 255)),
            "green" => Some(Color::rgba(0, 128, 0, 255)),
            "blue" => Some(Color::rgba(0, 0, 255, 255)),
            "yellow" => Some(Color::rgba(255, 255, 0, 255)),
            "transparent" => Some(Color::rgba(0, 0, 0, 0)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| format!("Invalid color '{}'", s))?;
        if !hex.is_ascii() {
            return Err(format!("Invalid color '{}'", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("Invalid color '{}'", s))
        };
        match hex.len() {
            3 => {
                let mut out = [0u8; 4];
                for (i, c) in hex.chars().enumerate() {
                    let v = c
                        .to_digit(16)
                        .ok_or_else(|| format!("Invalid color '{}'", s))? as u8;
                    out[i] = v * 17;
                }
                out[3] = 255;
                Ok(Color(Rgba(out)))
            }
            6 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(format!("Invalid color '{}'", s)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Where the center of the text block sits vertically.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VerticalAnchor {
    /// Image vertical midpoint.
    #[default]
    Middle,
    /// Midpoint pushed down by a fraction of the image height.
    BelowMiddle { fraction: f32 },
    /// Centered within the lower half of the image.
    LowerHalf,
    /// Absolute row.
    Pixel(i32),
}

impl VerticalAnchor {
    /// Anchor row for an image of the given height.
    pub fn resolve(&self, image_height: u32) -> f32 {
        let h = image_height as f32;
        match *self {
            VerticalAnchor::Middle => h / 2.0,
            VerticalAnchor::BelowMiddle { fraction } => h / 2.0 + fraction * h,
            VerticalAnchor::LowerHalf => h * 0.75,
            VerticalAnchor::Pixel(y) => y as f32,
        }
    }
}

impl FromStr for VerticalAnchor {
    type Err = String;

    /// `middle`, `lower-half`, `below-middle[:fraction]` or `px:<row>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let (name, arg) = match value.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (value.as_str(), None),
        };
        match (name, arg) {
            ("middle" | "center", None) => Ok(VerticalAnchor::Middle),
            ("lower-half" | "lower_half", None) => Ok(VerticalAnchor::LowerHalf),
            ("below-middle" | "below_middle", None) => {
                Ok(VerticalAnchor::BelowMiddle { fraction: 0.1 })
            }
            ("below-middle" | "below_middle", Some(arg)) => arg
                .parse::<f32>()
                .map(|fraction| VerticalAnchor::BelowMiddle { fraction })
                .map_err(|_| format!("Invalid anchor fraction '{}'", arg)),
            ("px", Some(arg)) => arg
                .parse::<i32>()
                .map(VerticalAnchor::Pixel)
                .map_err(|_| format!("Invalid anchor row '{}'", arg)),
            _ => Err(format!("Unknown anchor '{}'", s)),
        }
    }
}

/// Decoration drawn beneath the fill.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TextEffect {
    #[default]
    None,
    /// Ring of `radius` pixels drawn at every surrounding offset.
    Outline { radius: u32, color: Color },
    /// Single copy drawn at a fixed offset.
    Shadow { dx: i32, dy: i32, color: Color },
}

impl TextEffect {
    /// Two-pixel black outline.
    pub fn outline() -> Self {
        TextEffect::Outline {
            radius: 2,
            color: Color::BLACK,
        }
    }

    /// Semi-transparent black shadow offset by three pixels.
    pub fn shadow() -> Self {
        TextEffect::Shadow {
            dx: 3,
            dy: 3,
            color: Color::SHADOW,
        }
    }

    /// Offsets at which the effect is stamped, in drawing order.
    ///
    /// Outline radii are capped at [`MAX_OUTLINE_RADIUS`].
    pub fn offsets(&self) -> Vec<(i32, i32)> {
        match *self {
            TextEffect::None => Vec::new(),
            TextEffect::Outline { radius, .. } => {
                let radius = radius.min(MAX_OUTLINE_RADIUS);
                let side = 2 * radius as usize + 1;
                let r = radius as i32;
                let mut offsets = Vec::with_capacity(side * side - 1);
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx != 0 || dy != 0 {
                            offsets.push((dx, dy));
                        }
                    }
                }
                offsets
            }
            TextEffect::Shadow { dx, dy, .. } => vec![(dx, dy)],
        }
    }

    pub fn color(&self) -> Option<Color> {
        match *self {
            TextEffect::None => None,
            TextEffect::Outline { color, .. } | TextEffect::Shadow { color, .. } => Some(color),
        }
    }
}

impl FromStr for TextEffect {
    type Err = String;

    /// `none`, `outline[:radius]` or `shadow`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.split_once(':') {
            None => match value.as_str() {
                "none" | "" => Ok(TextEffect::None),
                "outline" => Ok(TextEffect::outline()),
                "shadow" => Ok(TextEffect::shadow()),
                _ => Err(format!("Unknown effect '{}'", s)),
            },
            Some(("outline", radius)) => {
                let parsed = radius
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid outline radius '{}'", radius))?;
                if parsed > MAX_OUTLINE_RADIUS {
                    return Err(format!(
                        "Outline radius {} exceeds the maximum of {}",
                        parsed, MAX_OUTLINE_RADIUS
                    ));
                }
                Ok(TextEffect::Outline {
                    radius: parsed,
                    color: Color::BLACK,
                })
            }
            Some(_) => Err(format!("Unknown effect '{}'", s)),
        }
    }
}

/// Rule set deciding where and how a caption is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPolicy {
    /// Margin on each side; the width budget is the image width minus both.
    pub side_margin: u32,
    pub line_gap: u32,
    pub anchor: VerticalAnchor,
    pub fill: Color,
    pub effect: TextEffect,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            side_margin: DEFAULT_SIDE_MARGIN,
            line_gap: DEFAULT_LINE_GAP,
            anchor: VerticalAnchor::Middle,
            fill: Color::WHITE,
            effect: TextEffect::outline(),
        }
    }
}

impl PlacementPolicy {
    pub fn with_anchor(mut self, anchor: VerticalAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_side_margin(mut self, margin: u32) -> Self {
        self.side_margin = margin;
        self
    }

    /// Maximum line width for an image of the given width (at least 1px).
    pub fn width_budget(&self, image_width: u32) -> f32 {
        image_width
            .saturating_sub(self.side_margin.saturating_mul(2))
            .max(1) as f32
    }
}
