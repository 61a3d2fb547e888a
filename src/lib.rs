//! Background removal for images through Google's Gemini image models
//!
//! The crate wraps a single `generateContent` call that asks Gemini to cut the
//! subject out of an uploaded image, and a small controller that reads a file,
//! submits it, and writes the transparent PNG that comes back.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
