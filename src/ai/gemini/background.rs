//! Gemini implementation of [`BackgroundRemovalService`].
//!
//! One call sends the source image together with a fixed instruction and asks
//! for an image-only reply. The first inline image found in the reply, scanning
//! candidates in order and parts in order within each candidate, is the result.

use super::client::GeminiTransport;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::BackgroundRemovalService;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

const NO_IMAGE_MESSAGE: &str =
    "No image data returned from Gemini API: response was empty or malformed";
const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown error communicating with the Gemini API";

pub struct GeminiBackgroundRemover {
    api_key: Option<String>,
    model: String,
    transport: Arc<dyn GeminiTransport>,
}

impl GeminiBackgroundRemover {
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(
        api_key: Option<String>,
        model: String,
        transport: Arc<dyn GeminiTransport>,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            api_key,
            model,
            transport,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "GEMINI_API_KEY is not set; configure a Gemini API key before removing backgrounds"
                        .to_string(),
                )
            })
    }

    fn build_request(image_data: &str, content_type: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: content_type.to_string(),
                            data: image_data.to_string(),
                        },
                    },
                    Part::Text {
                        text: prompts::REMOVE_BACKGROUND.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }

    fn extract_image(response: GenerateContentResponse) -> Result<String> {
        let inline_parts = response
            .parts()
            .filter(|part| matches!(part, Part::InlineData { .. }))
            .count();
        if inline_parts > 1 {
            tracing::debug!(
                "Gemini returned {} inline parts; using the first",
                inline_parts
            );
        }

        if let Some(image) = response.first_inline_data() {
            tracing::debug!("Gemini returned image with mime_type: {}", image.mime_type);
            return Ok(image.data.clone());
        }

        let finish_reasons: Vec<&str> = response
            .candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .collect();
        let block_reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        tracing::warn!(
            "Gemini response had no image ({} candidates, finish reasons {:?}, block reason {:?})",
            response.candidates.len(),
            finish_reasons,
            block_reason
        );

        Err(Error::EmptyResponse(NO_IMAGE_MESSAGE.to_string()))
    }
}

#[async_trait]
impl BackgroundRemovalService for GeminiBackgroundRemover {
    async fn remove_background(&self, image_data: &str, content_type: &str) -> Result<String> {
        let api_key = self.require_api_key()?.to_string();

        tracing::debug!(
            "Removing background from {} image ({} base64 chars) with {}",
            content_type,
            image_data.len(),
            self.model
        );

        let request = Self::build_request(image_data, content_type);
        let transport = Arc::clone(&self.transport);
        let model = self.model.clone();

        // The spawned task keeps running if the caller stops waiting.
        let handle = tokio::spawn(async move {
            transport.generate_content(&api_key, &model, &request).await
        });

        let response = match handle.await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!("Error calling Gemini API: {}", e);
                return Err(e);
            }
            Err(join_error) => {
                tracing::error!("Error calling Gemini API: {}", join_error);
                return Err(Error::Unknown(UNKNOWN_FAILURE_MESSAGE.to_string()));
            }
        };

        Self::extract_image(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::{test_support, GeminiHttpClient, MockGeminiTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header};
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    fn make_remover(
        api_key: Option<&str>,
        transport: &MockGeminiTransport,
    ) -> GeminiBackgroundRemover {
        GeminiBackgroundRemover::new(
            api_key.map(str::to_string),
            DEFAULT_MODEL.to_string(),
            Arc::new(transport.clone()),
        )
    }

    #[tokio::test]
    async fn test_returns_first_inline_image_after_text() {
        let transport = MockGeminiTransport::new().with_response(response(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "done" },
                        { "inlineData": { "mimeType": "image/png", "data": "UE5HLVg=" } },
                        { "text": "anything else?" }
                    ]
                }
            }]
        })));

        let result = make_remover(Some("key"), &transport)
            .remove_background("/9j/4AAQ", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(result, "UE5HLVg=");
        assert_eq!(transport.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_ignores_images_in_later_candidates() {
        let transport = MockGeminiTransport::new().with_response(response(json!({
            "candidates": [
                { "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "Zmlyc3Q=" } }] } },
                { "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "c2Vjb25k" } }] } }
            ]
        })));

        let result = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap();

        assert_eq!(result, "Zmlyc3Q=");
    }

    #[tokio::test]
    async fn test_finds_image_in_second_candidate() {
        let transport = MockGeminiTransport::new().with_response(response(json!({
            "candidates": [
                { "finishReason": "SAFETY" },
                { "content": { "parts": [{ "text": "here you go" }] } },
                { "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "dGhpcmQ=" } }] } }
            ]
        })));

        let result = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap();

        assert_eq!(result, "dGhpcmQ=");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_calling_transport() {
        let transport = MockGeminiTransport::new();

        for key in [None, Some(""), Some("   ")] {
            let err = make_remover(key, &transport)
                .remove_background("AAAA", "image/png")
                .await
                .unwrap_err();

            assert!(matches!(err, Error::Config(ref m) if m.contains("GEMINI_API_KEY")));
        }

        assert_eq!(transport.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_candidates_is_empty_response() {
        let transport =
            MockGeminiTransport::new().with_response(response(json!({ "candidates": [] })));

        let err = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyResponse(ref m) if m.contains("empty or malformed")));
    }

    #[tokio::test]
    async fn test_text_only_response_is_empty_response() {
        let transport = MockGeminiTransport::new().with_response(response(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot edit this image." }] } }]
        })));

        let err = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_error_message_is_preserved() {
        let transport =
            MockGeminiTransport::new().with_failure("Gemini API error (status 429): quota");

        let err = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "AI provider error: Gemini API error (status 429): quota"
        );
        assert_eq!(transport.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_unstructured_failure_is_wrapped() {
        let transport = MockGeminiTransport::new().with_panic("socket exploded");

        let err = make_remover(Some("key"), &transport)
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Unknown(_)));
        assert_eq!(err.to_string(), UNKNOWN_FAILURE_MESSAGE);
        assert!(!err.to_string().contains("socket exploded"));
    }

    #[tokio::test]
    async fn test_request_carries_image_then_instruction() {
        let transport = MockGeminiTransport::new().with_response(response(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "QQ==" } }] } }]
        })));

        let remover = GeminiBackgroundRemover::new(
            Some("secret".to_string()),
            format!("models/{DEFAULT_MODEL}"),
            Arc::new(transport.clone()),
        );
        assert_eq!(remover.model(), DEFAULT_MODEL);

        remover
            .remove_background("/9j/4AAQ", "image/jpeg")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "secret");
        assert_eq!(calls[0].model, DEFAULT_MODEL);
        assert_eq!(
            serde_json::to_value(&calls[0].request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } },
                        { "text": prompts::REMOVE_BACKGROUND }
                    ]
                }],
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })
        );
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "done" },
                            { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                        ]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GeminiHttpClient::new(Duration::from_secs(5)).with_base_url(server.uri());
        let remover = GeminiBackgroundRemover::new(
            Some("test-key".to_string()),
            DEFAULT_MODEL.to_string(),
            Arc::new(transport),
        );

        let result = remover
            .remove_background("/9j/4AAQSkZJRg==", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(result, "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_no_http_request() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = GeminiHttpClient::new(Duration::from_secs(5)).with_base_url(server.uri());
        let remover =
            GeminiBackgroundRemover::new(None, DEFAULT_MODEL.to_string(), Arc::new(transport));

        let err = remover
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_http_error_status_surfaces_as_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let transport = GeminiHttpClient::new(Duration::from_secs(5)).with_base_url(server.uri());
        let remover = GeminiBackgroundRemover::new(
            Some("bad-key".to_string()),
            DEFAULT_MODEL.to_string(),
            Arc::new(transport),
        );

        let err = remover
            .remove_background("AAAA", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(ref m) if m.contains("forbidden")));
    }
}
