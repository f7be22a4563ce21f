use thiserror::Error;

use crate::openai::OpenAiError;

#[derive(Debug, Error)]
pub enum MonarchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] OpenAiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
