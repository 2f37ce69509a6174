//! # PixelGenius - Image Generation and Captioning Library
//!
//! PixelGenius turns a text prompt into a batch of styled images through a
//! hosted text-to-image endpoint, adjusts them, and draws captions onto
//! user-supplied images. It provides:
//!
//! - **Compositor**: word-wrapped, centered caption text with outline or shadow
//! - **Filters**: brightness, contrast and sharpness enhancement factors
//! - **Inference**: HTTP client for text-to-image endpoints
//! - **Server**: axum web interface with per-user sessions
//!
//! ## Quick Start
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use pixelgenius::compositor::{self, FontSpec, PlacementPolicy, TextEffect};
//!
//! let photo = DynamicImage::ImageRgb8(RgbImage::new(800, 600));
//! let placement = PlacementPolicy::default().with_effect(TextEffect::shadow());
//! let result = compositor::composite(&photo, "Hello there", &FontSpec::builtin(), 40, &placement);
//!
//! assert_eq!(result.image.width(), 800);
//! assert_eq!(result.lines[0].line.text, "Hello there");
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`compositor`] | Caption layout and rendering |
//! | [`filters`] | Enhancement factors |
//! | [`inference`] | Text-to-image client |
//! | [`generate`] | Style expansion and batch runs |
//! | [`archive`] | Zip packaging of a batch |
//! | [`session`] | Prompt history and last batch |
//! | [`server`] | HTTP interface |
//! | [`canvas`] | Pixel buffer helpers (color mode, PNG, previews) |
//! | [`config`] | Runtime configuration |
//! | [`error`] | Error types |

pub mod archive;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod filters;
pub mod generate;
pub mod inference;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::PixelError;
pub use inference::{HttpGenerator, ImageGenerator};
