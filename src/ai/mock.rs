use super::BackgroundRemovalService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A tiny 1x1 PNG, base64 encoded.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

pub struct MockBackgroundRemover {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
    last_content_type: Arc<Mutex<Option<String>>>,
}

impl MockBackgroundRemover {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            last_content_type: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with [`Error::AiProvider`] carrying `message`.
    pub fn with_failure(self, message: String) -> Self {
        *self.failure.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_content_type(&self) -> Option<String> {
        self.last_content_type.lock().unwrap().clone()
    }

    /// Shares counters with `self`, so a clone handed to a controller can still be inspected.
    pub fn handle(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            failure: Arc::clone(&self.failure),
            call_count: Arc::clone(&self.call_count),
            last_content_type: Arc::clone(&self.last_content_type),
        }
    }
}

impl Default for MockBackgroundRemover {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundRemovalService for MockBackgroundRemover {
    async fn remove_background(&self, _image_data: &str, content_type: &str) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        *self.last_content_type.lock().unwrap() = Some(content_type.to_string());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::AiProvider(message));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG_BASE64.to_string())
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
