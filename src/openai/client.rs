use std::time::Duration;

use reqwest::Client;

use super::error::OpenAiError;
use super::types::{
    ChatMessage, ChatRequest, ChatResponse, ImageDatum, ImageRequest, ImageResponse,
};
use super::ChatBackend;
use crate::worker::ModelTier;

const API_BASE: &str = "https://api.openai.com/v1";
const IMAGE_MODEL: &str = "dall-e-3";
const IMAGE_SIZE: &str = "1024x1024";

pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_BASE.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url,
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, OpenAiError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(OpenAiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(OpenAiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

impl ChatBackend for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        model: ModelTier,
    ) -> Result<String, OpenAiError> {
        let req = ChatRequest {
            model: model.api_name().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user.to_string(),
                },
            ],
        };
        let resp: ChatResponse = self.post_json("/chat/completions", &req).await?;
        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpenAiError::ParseError("response contained no choices".into()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, OpenAiError> {
        let req = ImageRequest {
            model: IMAGE_MODEL.to_string(),
            prompt: prompt.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
        };
        let resp: ImageResponse = self.post_json("/images/generations", &req).await?;
        resp.data
            .into_iter()
            .next()
            .map(|ImageDatum { url }| url)
            .ok_or_else(|| OpenAiError::ParseError("response contained no images".into()))
    }
}
