//! Session-scoped downloads: previews, the zip archive and prompt history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::archive::{self, ARCHIVE_NAME};
use crate::canvas;
use crate::session::HistoryEntry;

use super::super::state::AppState;
use super::parse_session_id;

/// Query parameters for the image endpoint.
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    /// Serve the original resolution instead of the 640x360 preview.
    #[serde(default)]
    pub full: bool,
}

/// Response from the history endpoint.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session: String,
    pub history: Vec<HistoryEntry>,
}

/// Clone the last batch out of a session so the lock is released before encoding.
async fn batch_of(
    state: &AppState,
    session_id: Uuid,
) -> Result<Vec<(String, DynamicImage)>, (StatusCode, String)> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found or expired".to_string()))?;
    session.touch();
    Ok(session.batch.clone())
}

/// GET /api/session/:id/images/:index - PNG of one generated image.
pub async fn image(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
    Query(query): Query<ImageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;

    let source = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or((StatusCode::NOT_FOUND, "Session not found or expired".to_string()))?;
        session.touch();
        session
            .batch
            .get(index)
            .map(|(_, img)| img.clone())
            .ok_or((StatusCode::NOT_FOUND, format!("No image at index {}", index)))?
    };

    let full = query.full;
    let png_bytes = tokio::task::spawn_blocking(move || {
        let img = if full { source } else { canvas::preview(&source) };
        canvas::encode_png(&img)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Processing error: {}", e),
        )
    })?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        png_bytes,
    ))
}

/// GET /api/session/:id/archive - Zip of the last batch.
pub async fn archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;
    let batch = batch_of(&state, session_id).await?;
    if batch.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            "No images to download yet".to_string(),
        ));
    }

    let zip_bytes = tokio::task::spawn_blocking(move || archive::package(&batch))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing error: {}", e),
            )
        })?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ARCHIVE_NAME),
            ),
        ],
        zip_bytes,
    ))
}

/// GET /api/session/:id/history - Recent prompts, newest first.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, (StatusCode, String)> {
    let session_id = parse_session_id(&id)?;
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or((StatusCode::NOT_FOUND, "Session not found or expired".to_string()))?;
    session.touch();

    Ok(Json(HistoryResponse {
        session: session_id.to_string(),
        history: session.history.recent().cloned().collect(),
    }))
}
