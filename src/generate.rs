//! Styled prompt batches.
//!
//! A [`GenerationRequest`] expands into one prompt per style and image slot
//! (`"{style} style - {prompt}"`). Batches run one image at a time; a failed
//! image is recorded as a message and the rest of the batch continues.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::filters::{self, Adjustments};
use crate::inference::ImageGenerator;

/// Most images generated per style in one request.
pub const MAX_IMAGES_PER_STYLE: u32 = 2;

/// Art direction prepended to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Realistic,
    Anime,
    Sketch,
    Cyberpunk,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Realistic, Style::Anime, Style::Sketch, Style::Cyberpunk];

    pub fn name(&self) -> &'static str {
        match self {
            Style::Realistic => "Realistic",
            Style::Anime => "Anime",
            Style::Sketch => "Sketch",
            Style::Cyberpunk => "Cyberpunk",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One style, or every style in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChoice {
    All,
    One(Style),
}

/// A single realistic image unless asked otherwise; `All` costs one call per style.
impl Default for StyleChoice {
    fn default() -> Self {
        StyleChoice::One(Style::Realistic)
    }
}

impl StyleChoice {
    pub fn styles(&self) -> Vec<Style> {
        match self {
            StyleChoice::All => Style::ALL.to_vec(),
            StyleChoice::One(style) => vec![*style],
        }
    }
}

impl FromStr for StyleChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value == "all" || value == "all styles" || value == "all-styles" {
            return Ok(StyleChoice::All);
        }
        Style::ALL
            .iter()
            .find(|style| style.name().eq_ignore_ascii_case(&value))
            .map(|style| StyleChoice::One(*style))
            .ok_or_else(|| format!("Unknown style '{}'", s))
    }
}

/// A prompt submission with its styling and filters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: StyleChoice,
    /// Images per style, clamped to 1..=[`MAX_IMAGES_PER_STYLE`].
    pub count: u32,
    pub adjustments: Adjustments,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: StyleChoice::default(),
            count: 1,
            adjustments: Adjustments::default(),
        }
    }

    pub fn with_style(mut self, style: StyleChoice) -> Self {
        self.style = style;
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_adjustments(mut self, adjustments: Adjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    /// Expand into labelled prompts. Empty prompts plan nothing.
    pub fn plan(&self) -> Vec<PlannedImage> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Vec::new();
        }
        let count = self.count.clamp(1, MAX_IMAGES_PER_STYLE);

        self.style
            .styles()
            .into_iter()
            .flat_map(|style| {
                (1..=count).map(move |i| PlannedImage {
                    label: format!("{} Image {}", style, i),
                    prompt: format!("{} style - {}", style, prompt),
                })
            })
            .collect()
    }
}

/// One image slot of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedImage {
    pub label: String,
    pub prompt: String,
}

/// What a batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful images in plan order, filters applied.
    pub images: Vec<(String, DynamicImage)>,
    /// One displayable message per failed slot.
    pub errors: Vec<String>,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Run every planned slot against the generator.
pub async fn run_batch(
    generator: &dyn ImageGenerator,
    request: &GenerationRequest,
) -> BatchOutcome {
    let plan = request.plan();
    let mut outcome = BatchOutcome::default();
    if plan.is_empty() {
        return outcome;
    }

    info!(images = plan.len(), "generating batch");
    for slot in plan {
        match generator.generate(&slot.prompt).await {
            Ok(img) => {
                let img = filters::apply(&img, request.adjustments);
                outcome.images.push((slot.label, img));
            }
            Err(e) => {
                warn!(label = %slot.label, error = %e, "image generation failed");
                outcome.errors.push(format!("{}: {}", slot.label, e));
            }
        }
    }

    outcome
}
