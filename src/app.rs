//! Upload/preview controller: reads an image, runs background removal, and
//! saves or previews the result.

use crate::ai::{BackgroundRemovalService, GeminiBackgroundRemover, GeminiHttpClient};
use crate::image::{download_file_name, ensure_image, from_data_url, inspect_image};
use crate::models::{Config, ImagePayload};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct App {
    remover: Box<dyn BackgroundRemovalService>,
}

impl App {
    /// Build an app around any removal service. Used by tests to inject mocks.
    pub fn with_service(remover: Box<dyn BackgroundRemovalService>) -> Self {
        Self { remover }
    }

    /// Construct the Gemini-backed app from configuration.
    pub fn new(config: &Config) -> Self {
        if config.api_key.is_none() {
            warn!("GEMINI_API_KEY is not set; background removal requests will fail");
        }

        let transport =
            GeminiHttpClient::new(config.timeout).with_base_url(config.base_url.clone());
        let remover = GeminiBackgroundRemover::new(
            config.api_key.clone(),
            config.model.clone(),
            Arc::new(transport),
        );
        info!("Background removal provider: Gemini (model: {})", remover.model());

        Self::with_service(Box::new(remover))
    }

    /// Reads `input`, removes its background, and returns the PNG payload.
    pub async fn remove_background_file(&self, input: &Path) -> Result<ImagePayload> {
        let bytes = tokio::fs::read(input).await?;
        let image = inspect_image(&bytes).map_err(|e| {
            Error::InvalidInput(format!(
                "{} is not a supported image file: {}",
                input.display(),
                e
            ))
        })?;
        info!(
            "Removing background from {} ({}, {}x{}, {} bytes)",
            input.display(),
            image.content_type(),
            image.width,
            image.height,
            bytes.len()
        );

        let original = ImagePayload::from_bytes(&bytes, image.content_type());
        self.remove_background_payload(&original).await
    }

    /// Same as [`App::remove_background_file`] for an image given as a
    /// `data:<type>;base64,<data>` URL.
    pub async fn remove_background_data_url(&self, url: &str) -> Result<ImagePayload> {
        let original = from_data_url(url)?;
        let image = inspect_image(&original.decode()?).map_err(|e| {
            Error::InvalidInput(format!("data URL does not hold a supported image: {}", e))
        })?;
        info!(
            "Removing background from data URL ({}, {}x{})",
            original.content_type, image.width, image.height
        );

        self.remove_background_payload(&original).await
    }

    pub async fn remove_background_payload(
        &self,
        original: &ImagePayload,
    ) -> Result<ImagePayload> {
        let data = self
            .remover
            .remove_background(&original.data, &original.content_type)
            .await?;

        let processed = ImagePayload::processed(data);
        ensure_image(&processed.decode()?)?;
        Ok(processed)
    }

    /// Processes `input` and writes the result to `output`, or next to the
    /// input as `<stem>-sem-fundo.png`. Returns the path written.
    pub async fn run(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let processed = self.remove_background_file(input).await?;

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => input.with_file_name(download_file_name(input)),
        };

        Self::save(&processed, &output).await?;
        Ok(output)
    }

    /// Writes the decoded image bytes of `processed` to `output`.
    pub async fn save(processed: &ImagePayload, output: &Path) -> Result<()> {
        tokio::fs::write(output, processed.decode()?).await?;
        info!("Saved image without background to {}", output.display());
        Ok(())
    }
}
