//! Prompt submission handler.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::filters::Adjustments;
use crate::generate::{GenerationRequest, StyleChoice, run_batch};
use crate::session::{HistoryEntry, Session};

use super::super::state::AppState;
use super::parse_session_id;

/// Shown when a batch produced nothing.
pub const NO_IMAGES_MESSAGE: &str =
    "No images were generated. Try another prompt or check API status.";

/// Request body for the generate endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Existing session to continue; a new one is created when absent or unknown.
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(flatten)]
    pub adjustments: Adjustments,
}

fn default_count() -> u32 {
    1
}

/// One generated image in the response.
#[derive(Debug, Serialize)]
pub struct GeneratedImage {
    pub index: usize,
    pub label: String,
    pub preview_url: String,
    pub full_url: String,
}

/// Response from the generate endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session: String,
    pub images: Vec<GeneratedImage>,
    pub errors: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub archive_url: Option<String>,
    pub message: Option<String>,
}

/// POST /api/generate - Run a batch for a prompt.
///
/// Generation failures are reported in the body; only malformed input is a 4xx.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let prompt = req.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Enter a prompt to generate images.".to_string(),
        ));
    }

    let style = match req.style.as_deref() {
        Some(s) if !s.trim().is_empty() => s
            .parse::<StyleChoice>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        _ => StyleChoice::default(),
    };

    let session_id = match req.session.as_deref() {
        Some(id) if !id.is_empty() => parse_session_id(id)?,
        _ => Uuid::new_v4(),
    };

    // Record the prompt before the (slow) inference calls
    {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(state.config.history_capacity));
        session.touch();
        session.history.push(prompt.clone());
    }

    let request = GenerationRequest::new(prompt)
        .with_style(style)
        .with_count(req.count)
        .with_adjustments(req.adjustments.clamped());

    let outcome = run_batch(state.generator.as_ref(), &request).await;

    let labels: Vec<String> = outcome.images.iter().map(|(label, _)| label.clone()).collect();
    let history = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(state.config.history_capacity));
        session.touch();
        if !outcome.is_empty() {
            session.batch = outcome.images;
        }
        session.history.recent().cloned().collect::<Vec<_>>()
    };

    let images = labels
        .into_iter()
        .enumerate()
        .map(|(index, label)| GeneratedImage {
            index,
            label,
            preview_url: format!("/api/session/{}/images/{}", session_id, index),
            full_url: format!("/api/session/{}/images/{}?full=true", session_id, index),
        })
        .collect::<Vec<_>>();

    let (archive_url, message) = if images.is_empty() {
        (None, Some(NO_IMAGES_MESSAGE.to_string()))
    } else {
        (Some(format!("/api/session/{}/archive", session_id)), None)
    };

    Ok(Json(GenerateResponse {
        session: session_id.to_string(),
        images,
        errors: outcome.errors,
        history,
        archive_url,
        message,
    }))
}
