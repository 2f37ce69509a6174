//! # HTTP Server
//!
//! Web interface for generating images from prompts, adjusting them, adding
//! captions to uploads and downloading the results.
//!
//! ## Usage
//!
//! ```bash
//! HUGGINGFACE_TOKEN=hf_xxx pixelgenius serve --listen 0.0.0.0:8080
//! ```
//!
//! Then open http://localhost:8080 in a browser.

mod handlers;
mod state;
mod static_files;

pub use state::{AppState, SESSION_EXPIRATION_SECS};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::error::PixelError;
use crate::inference::ImageGenerator;

/// Upload limit for caption images (50MB).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        // Generation API
        .route("/api/generate", post(handlers::generate::generate))
        // Session API
        .route(
            "/api/session/:id/images/:index",
            get(handlers::session::image),
        )
        .route("/api/session/:id/archive", get(handlers::session::archive))
        .route("/api/session/:id/history", get(handlers::session::history))
        // Caption API
        .route(
            "/api/caption",
            post(handlers::caption::caption).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use pixelgenius::config::AppConfig;
/// use pixelgenius::server::serve;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), pixelgenius::error::PixelError> {
/// let config = AppConfig::default();
/// let generator = config.generator()?;
/// serve(config, Arc::new(generator)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(
    config: AppConfig,
    generator: Arc<dyn ImageGenerator>,
) -> Result<(), PixelError> {
    let listen_addr = config.listen_addr.clone();
    info!(listen = %listen_addr, endpoint = %config.endpoint, "PixelGenius HTTP server starting");
    if config.token.is_none() {
        info!("no API token configured; requests are sent unauthenticated");
    }

    let app_state = Arc::new(AppState::new(config, generator));

    // Spawn background session cleanup task
    tokio::spawn(cleanup_sessions(app_state.clone()));

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| PixelError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    info!("Open http://{}/ in your browser", listen_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| PixelError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop expired sessions.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));

    loop {
        interval.tick().await;
        let removed = state.expire_sessions(Instant::now()).await;
        if removed > 0 {
            info!(removed, "cleaned up expired sessions");
        }
    }
}
