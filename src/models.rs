//! Data models and configuration
//!
//! Defines the image payload passed between the controller and the adapter,
//! and the environment-driven settings for the Gemini connection.

use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Content type every image returned by the service is tagged with.
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// Base64-encoded image plus the content type describing its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: String,
    pub content_type: String,
}

impl ImagePayload {
    pub fn new(data: String, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], content_type: impl Into<String>) -> Self {
        use base64::Engine as _;
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type,
        )
    }

    /// Wraps base64 data returned by the service. The output is always PNG.
    pub fn processed(data: String) -> Self {
        Self::new(data, OUTPUT_CONTENT_TYPE)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        use base64::Engine as _;
        Ok(base64::engine::general_purpose::STANDARD.decode(&self.data)?)
    }
}

// Configuration
#[derive(Clone)]
pub struct Config {
    /// `None` when no credential was configured. Calls fail until one is set.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

// Keeps the credential out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads variables from `path` before reading the environment.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenvy::from_path(path)?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY").or_else(|| non_blank("API_KEY"));

        let timeout_secs = match non_blank("GEMINI_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(Error::Config(format!(
                        "GEMINI_TIMEOUT_SECS must be a positive number of seconds (got '{}')",
                        raw
                    )))
                }
                Ok(secs) => secs,
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model: non_blank("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_blank("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
