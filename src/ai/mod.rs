//! AI service integration for background removal
//!
//! Defines the provider-agnostic [`BackgroundRemovalService`] seam and the
//! Gemini implementation behind it.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiBackgroundRemover, GeminiHttpClient, GeminiTransport, MockGeminiTransport};
pub use mock::MockBackgroundRemover;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BackgroundRemovalService: Send + Sync {
    /// Takes base64 image data and its content type, returns the base64 PNG
    /// with the background removed.
    async fn remove_background(&self, image_data: &str, content_type: &str) -> Result<String>;
}
