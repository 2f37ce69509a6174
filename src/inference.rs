//! # Inference client
//!
//! Turns a prompt into an image by calling a text-to-image HTTP endpoint.
//!
//! Endpoints answer in one of three shapes, all of which are valid responses
//! to branch on:
//!
//! - raw encoded image bytes (hosted inference API),
//! - a JSON envelope carrying a base64 payload (local servers),
//! - a non-success status with a textual message.
//!
//! Every failure becomes an [`InferenceError`] for the caller to display.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Hosted Stable Diffusion XL endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

/// Default request-level timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error body echoed back to the user.
const MAX_MESSAGE_LEN: usize = 500;

/// Inference failure, always recoverable.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Endpoint answered with a non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Endpoint answered 2xx with an error envelope
    #[error("API error: {0}")]
    Api(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or protocol failure
    #[error("request failed: {0}")]
    Request(String),

    /// Body was neither an image nor a recognizable envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Payload was found but is not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Something that can turn a prompt into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, InferenceError>;
}

/// Generator backed by an HTTP inference endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .user_agent("pixelgenius/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Request(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, InferenceError> {
        let payload = serde_json::json!({
            "inputs": prompt,
            "options": { "wait_for_model": true },
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        info!(endpoint = %self.endpoint, "requesting image");
        let response = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "inference response");

        decode_response(status, content_type.as_deref(), &body)
    }
}

impl HttpGenerator {
    fn map_transport(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout)
        } else {
            InferenceError::Request(e.to_string())
        }
    }
}

/// Branch on an endpoint response: error status, JSON envelope or raw image.
pub fn decode_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<DynamicImage, InferenceError> {
    if !status.is_success() {
        return Err(InferenceError::Status {
            status: status.as_u16(),
            message: error_message(body),
        });
    }

    let is_json = content_type.is_some_and(|ct| ct.contains("json"))
        || body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{');

    if is_json {
        let envelope: Value = serde_json::from_slice(body)
            .map_err(|e| InferenceError::MalformedResponse(format!("invalid JSON: {}", e)))?;
        let bytes = decode_envelope(&envelope)?;
        return image::load_from_memory(&bytes).map_err(|e| InferenceError::Decode(e.to_string()));
    }

    image::load_from_memory(body).map_err(|e| InferenceError::Decode(e.to_string()))
}

/// Extract and decode the base64 image payload from a JSON envelope.
fn decode_envelope(envelope: &Value) -> Result<Vec<u8>, InferenceError> {
    if let Some(error) = envelope.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(InferenceError::Api(message));
    }

    let payload = [
        envelope.get("image"),
        envelope.pointer("/images/0"),
        envelope.pointer("/data/0/b64_json"),
        envelope.get("output"),
        envelope.pointer("/artifacts/0/base64"),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_str)
    .ok_or_else(|| InferenceError::MalformedResponse("no image payload in response".to_string()))?;

    // Strip data-URI prefix ("data:image/png;base64,")
    let encoded = match payload.split_once(";base64,") {
        Some((_, data)) => data,
        None => payload,
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| InferenceError::Decode(format!("invalid base64 payload: {}", e)))
}

/// Human-readable message from an error body, JSON or text.
fn error_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string());
    let mut message = if message.is_empty() {
        "no message".to_string()
    } else {
        message
    };
    if message.len() > MAX_MESSAGE_LEN {
        let cut = (0..=MAX_MESSAGE_LEN)
            .rev()
            .find(|&i| message.is_char_boundary(i))
            .unwrap_or(0);
        message.truncate(cut);
        message.push('…');
    }
    message
}
