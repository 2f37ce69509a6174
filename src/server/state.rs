//! Server state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::inference::ImageGenerator;
use crate::session::Session;

/// Sessions idle for longer than this are dropped (1 hour).
pub const SESSION_EXPIRATION_SECS: u64 = 3600;

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub generator: Arc<dyn ImageGenerator>,
    /// Per-user sessions (history and last batch).
    pub sessions: RwLock<HashMap<Uuid, Session>>,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: u64,
}

impl AppState {
    pub fn new(config: AppConfig, generator: Arc<dyn ImageGenerator>) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            config,
            generator,
            sessions: RwLock::new(HashMap::new()),
            boot_time,
        }
    }

    /// Drop sessions idle past the expiration. Returns how many were removed.
    pub async fn expire_sessions(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            now.duration_since(session.last_accessed).as_secs() < SESSION_EXPIRATION_SECS
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceError;
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::time::Duration;

    struct NoGenerator;

    #[async_trait]
    impl ImageGenerator for NoGenerator {
        async fn generate(&self, _prompt: &str) -> Result<DynamicImage, InferenceError> {
            Err(InferenceError::Api("unused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_expire_sessions_drops_idle_only() {
        let state = AppState::new(AppConfig::default(), Arc::new(NoGenerator));
        let fresh = Uuid::new_v4();
        let stale = Uuid::new_v4();
        {
            let mut sessions = state.sessions.write().await;
            sessions.insert(fresh, Session::new(5));
            sessions.insert(stale, Session::new(5));
        }

        // Pretend the stale session was last used long ago by looking from the future
        let later = Instant::now() + Duration::from_secs(SESSION_EXPIRATION_SECS + 1);
        {
            let mut sessions = state.sessions.write().await;
            if let Some(session) = sessions.get_mut(&fresh) {
                session.last_accessed = later;
            }
        }

        assert_eq!(state.expire_sessions(later).await, 1);
        let sessions = state.sessions.read().await;
        assert!(sessions.contains_key(&fresh));
        assert!(!sessions.contains_key(&stale));
    }
}
