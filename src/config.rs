//! Runtime configuration shared by the server and the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::compositor::{FontSource, FontSpec, font::system_font_dirs};
use crate::inference::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, HttpGenerator, InferenceError};
use crate::session::DEFAULT_HISTORY_CAPACITY;

/// Environment variable holding the inference API token.
pub const TOKEN_ENV: &str = "HUGGINGFACE_TOKEN";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Text-to-image endpoint URL
    pub endpoint: String,
    /// Bearer token for the endpoint, if it needs one
    pub token: Option<String>,
    /// Request-level timeout for inference calls
    pub timeout: Duration,
    /// Directories searched for named fonts
    pub font_dirs: Vec<PathBuf>,
    /// Prompts remembered per session
    pub history_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            font_dirs: system_font_dirs(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Font spec for user input (`builtin`, a path or a face name) using the configured dirs.
    pub fn font_spec(&self, font: &str) -> FontSpec {
        FontSpec {
            source: FontSource::parse(font),
            fallbacks: Vec::new(),
            search_dirs: self.font_dirs.clone(),
        }
    }

    /// Font spec for a font named by a remote client.
    ///
    /// Only the built-in face or a face name searched in the configured dirs is
    /// accepted; file paths are rejected.
    pub fn client_font_spec(&self, font: &str) -> Result<FontSpec, String> {
        let spec = self.font_spec(font);
        match &spec.source {
            FontSource::File(_) => Err(format!(
                "Font '{}' must be a font name, not a path",
                font.trim()
            )),
            FontSource::Named(name) if name.starts_with('.') => {
                Err(format!("Invalid font name '{}'", name))
            }
            _ => Ok(spec),
        }
    }

    /// HTTP generator for the configured endpoint.
    pub fn generator(&self) -> Result<HttpGenerator, InferenceError> {
        HttpGenerator::new(self.endpoint.clone(), self.token.clone(), self.timeout)
    }
}
