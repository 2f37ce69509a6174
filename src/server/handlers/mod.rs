//! HTTP handlers for the server.

pub mod caption;
pub mod generate;
pub mod session;

use axum::http::StatusCode;
use uuid::Uuid;

/// Parse a session id path segment.
pub(crate) fn parse_session_id(id: &str) -> Result<Uuid, (StatusCode, String)> {
    Uuid::parse_str(id).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid session ID".to_string()))
}
