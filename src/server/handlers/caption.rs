//! Caption upload handler.

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::debug;

use crate::canvas;
use crate::compositor::{self, Color, PlacementPolicy, TextEffect, VerticalAnchor};

use super::super::state::AppState;

/// Download name of a captioned image.
pub const CAPTION_FILENAME: &str = "image_with_text.png";

/// Header carrying the reason a requested font was replaced.
pub const FONT_FALLBACK_HEADER: &str = "x-font-fallback";

/// Caption form fields, as uploaded.
#[derive(Debug, Default)]
struct CaptionForm {
    image: Option<Vec<u8>>,
    text: Option<String>,
    font: Option<String>,
    size: Option<String>,
    color: Option<String>,
    effect: Option<String>,
    anchor: Option<String>,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

/// Parse an optional form value, treating blanks as absent.
fn parse_field<T>(value: Option<&str>, what: &str) -> Result<Option<T>, (StatusCode, String)>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| bad_request(format!("Invalid {}: {}", what, e))),
        None => Ok(None),
    }
}

/// POST /api/caption - Draw text onto an uploaded image and return the PNG.
pub async fn caption(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut form = CaptionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read image: {}", e)))?;
            form.image = Some(bytes.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Failed to read field {}: {}", name, e)))?;
        match name.as_str() {
            "text" => form.text = Some(value),
            "font" => form.font = Some(value),
            "size" => form.size = Some(value),
            "color" => form.color = Some(value),
            "effect" => form.effect = Some(value),
            "anchor" => form.anchor = Some(value),
            _ => debug!(field = %name, "ignoring unknown caption field"),
        }
    }

    let image_bytes = form
        .image
        .filter(|b| !b.is_empty())
        .ok_or_else(|| bad_request("Upload an image and enter text to add a caption."))?;
    let text = form
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| bad_request("Upload an image and enter text to add a caption."))?;

    let size: Option<u32> = parse_field(form.size.as_deref(), "size")?;
    let fill: Option<Color> = parse_field(form.color.as_deref(), "color")?;
    let effect: Option<TextEffect> = parse_field(form.effect.as_deref(), "effect")?;
    let anchor: Option<VerticalAnchor> = parse_field(form.anchor.as_deref(), "anchor")?;

    let font = state
        .config
        .client_font_spec(form.font.as_deref().unwrap_or(""))
        .map_err(bad_request)?;

    let mut placement = PlacementPolicy::default();
    if let Some(fill) = fill {
        placement = placement.with_fill(fill);
    }
    if let Some(effect) = effect {
        placement = placement.with_effect(effect);
    }
    if let Some(anchor) = anchor {
        placement = placement.with_anchor(anchor);
    }

    // Decoding, compositing and encoding are CPU-bound
    let (png_bytes, fallback) = tokio::task::spawn_blocking(move || {
        let img = canvas::decode_image(&image_bytes)
            .map_err(|e| bad_request(format!("Failed to decode image: {}", e)))?;
        let size = size.unwrap_or_else(|| compositor::default_pixel_size(img.height()));
        let result = compositor::composite(&img, &text, &font, size, &placement);
        let png = canvas::encode_png(&result.image)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        Ok::<_, (StatusCode, String)>((png, result.fallback))
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Processing error: {}", e),
        )
    })??;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    let disposition = format!("attachment; filename=\"{}\"", CAPTION_FILENAME);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(err) = fallback {
        let reason: String = err
            .to_string()
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
            .collect();
        if let Ok(value) = HeaderValue::from_str(&reason) {
            headers.insert(FONT_FALLBACK_HEADER, value);
        }
    }

    Ok((headers, png_bytes))
}
