//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    /// Missing credential or unusable settings. Aimed at whoever deployed the tool.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with a failure status or an unreadable body.
    #[error("AI provider error: {0}")]
    AiProvider(String),

    /// The provider answered successfully but no part carried an image.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, Error>;
