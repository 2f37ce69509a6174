//! Embedded frontend page.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use super::state::AppState;

/// Single-page frontend.
const INDEX_HTML: &str = include_str!("index.html");

/// Serve the index page with a cache-busting parameter on API-loaded previews.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(INDEX_HTML.replace("__BOOT_TIME__", &state.boot_time.to_string()))
}
