//! OpenAI request/response payloads used by the upstream client.

use serde::{Deserialize, Serialize};

/// Request body for the Responses API. Built once per request by
/// [`crate::payload::build`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// One input message (system or user).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Message content union: plain string or typed content blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<InputBlock>),
}

/// One typed input block, e.g. `{"type": "input_text", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
}

impl InputBlock {
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            block_type: "input_text".to_string(),
            text: text.into(),
        }
    }
}

/// Request body for image generation. `gpt-image-1` rejects `response_format`,
/// so none is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
}

/// Top-level image generation response.
#[derive(Debug, Default, Deserialize)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub data: Vec<ImageData>,
}

/// One generated image item.
#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub b64_json: Option<String>,
}
