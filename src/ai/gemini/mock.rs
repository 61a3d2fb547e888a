use super::client::GeminiTransport;
use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted reply for [`MockGeminiTransport`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(GenerateContentResponse),
    /// Returned as [`Error::AiProvider`] carrying this message.
    Failure(String),
    /// Panics inside the transport, standing in for a failure with no usable error value.
    Panic(String),
}

/// A request the mock received, kept for assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
}

/// In-memory [`GeminiTransport`] that replays scripted replies in order.
#[derive(Clone, Default)]
pub struct MockGeminiTransport {
    replies: Arc<Mutex<Vec<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGeminiTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: GenerateContentResponse) -> Self {
        self.with_reply(MockReply::Response(response))
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.with_reply(MockReply::Failure(message.into()))
    }

    pub fn with_panic(self, message: impl Into<String>) -> Self {
        self.with_reply(MockReply::Panic(message.into()))
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeminiTransport for MockGeminiTransport {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        // Locks are released before replying so a scripted panic cannot poison them.
        let reply = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                api_key: api_key.to_string(),
                model: model.to_string(),
                request: request.clone(),
            });

            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies[(calls.len() - 1) % replies.len()].clone())
            }
        };

        match reply {
            None => Ok(GenerateContentResponse::default()),
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Failure(message)) => Err(Error::AiProvider(message)),
            Some(MockReply::Panic(message)) => panic!("{}", message),
        }
    }
}
