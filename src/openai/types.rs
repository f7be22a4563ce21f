//! Request and response types for the OpenAI chat-completions and
//! image-generation endpoints.
//!
//! All structs derive `Serialize` and `Deserialize` for JSON conversion
//! matching the wire format of the `v1/chat/completions` and
//! `v1/images/generations` endpoints.

use serde::{Deserialize, Serialize};

/// Request body for the `/v1/chat/completions` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g. "gpt-4o").
    pub model: String,
    /// Conversation messages (system and user).
    pub messages: Vec<ChatMessage>,
}

/// A single message in a chat-completions conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender role: "system", "user" or "assistant".
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

/// Response body from the `/v1/chat/completions` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One generated completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting for an API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Request body for the `/v1/images/generations` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

/// Response body from the `/v1/images/generations` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub data: Vec<ImageDatum>,
}

/// One generated image entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDatum {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_roundtrip() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "You are a scribe.".into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: "Hello".into(),
                },
            ],
        };
        let json = serde_json::to_string(&req).unwrap();
        let parsed: ChatRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, "gpt-4o");
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].role, "system");
        assert_eq!(parsed.messages[1].content, "Hello");
    }

    #[test]
    fn chat_response_deserialize_from_api_format() {
        let api_json = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-4o",
            "choices": [
                {"message": {"role": "assistant", "content": "Response here"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 5, "completion_tokens": 15}
        }"#;
        let resp: ChatResponse = serde_json::from_str(api_json).unwrap();
        assert_eq!(resp.id, "chatcmpl-123");
        assert_eq!(resp.choices[0].message.content, "Response here");
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn chat_response_missing_usage() {
        let json = r#"{
            "id": "chatcmpl-456",
            "model": "gpt-4o-mini",
            "choices": []
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(resp.usage.is_none());
        assert!(resp.choices.is_empty());
    }

    #[test]
    fn image_response_deserialize() {
        let json = r#"{"data": [{"url": "https://img.example/out.png"}]}"#;
        let resp: ImageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].url, "https://img.example/out.png");
    }
}
