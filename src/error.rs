//! # Error Types
//!
//! This module defines error types used throughout the pixelgenius library.
//!
//! None of these are fatal to a running server: handlers turn every variant
//! into a displayable message and leave the session usable.

use thiserror::Error;

use crate::compositor::FontError;
use crate::inference::InferenceError;

/// Main error type for pixelgenius operations
#[derive(Debug, Error)]
pub enum PixelError {
    /// Inference endpoint failure (status, timeout, malformed body)
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Font could not be resolved and no fallback was allowed
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Zip packaging error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Server transport errors (bind, serve)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
