pub mod client;
pub mod error;
pub mod types;

pub use client::OpenAiClient;
pub use error::OpenAiError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse};

use crate::worker::ModelTier;

/// Abstraction over the reasoning/image backend so orchestration code can be
/// exercised with scripted responses in tests.
pub trait ChatBackend {
    /// One chat completion with a system profile and a user prompt.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        model: ModelTier,
    ) -> Result<String, OpenAiError>;

    /// One image generation, returning the hosted image URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError>;
}
