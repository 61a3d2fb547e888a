pub mod background;
pub mod client;
pub mod mock;
pub mod types;

pub use background::GeminiBackgroundRemover;
pub use client::{GeminiHttpClient, GeminiTransport};
pub use mock::MockGeminiTransport;
