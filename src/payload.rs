//! Upstream payload construction
//!
//! Turns a [`GenerationRequest`] into the exact Responses API body. Output caps are
//! kept small because upstream latency grows with the number of generated tokens.

use crate::ai::openai::types::{InputBlock, InputMessage, MessageContent, ResponsesRequest};
use crate::error::truncate_chars;
use crate::models::{DetailLevel, GenerationRequest, Mode, ResolvedModel, ResultShape};
use crate::{prompts, GatewayError, Result};

pub const MAX_PROMPT_CHARS: usize = 12_000;
pub const MAX_OUTPUT_TOKENS: u32 = 4_000;
pub const DEFAULT_COUNT: u32 = 3;
pub const MAX_COUNT: u32 = 10;

const STRUCTURED_TEMPERATURE: f64 = 0.4;
const FREE_TEXT_TEMPERATURE: f64 = 0.85;
const TOKENS_PER_EXTRA_RECORD: u32 = 200;

/// Number of records the caller asked for, clamped to `1..=MAX_COUNT`.
pub fn effective_count(request: &GenerationRequest) -> u32 {
    request.count.unwrap_or(DEFAULT_COUNT).clamp(1, MAX_COUNT)
}

/// Output token cap for a mode/detail/count combination, never above
/// [`MAX_OUTPUT_TOKENS`].
pub fn output_cap(mode: Mode, detail: DetailLevel, count: u32) -> u32 {
    let base = match (mode, detail) {
        (Mode::Structured, DetailLevel::Brief) => 650,
        (Mode::Structured, DetailLevel::Standard) => 1_200,
        (Mode::Structured, DetailLevel::Detailed) => 2_000,
        (Mode::FreeText, DetailLevel::Brief) => 1_200,
        (Mode::FreeText, DetailLevel::Standard) => 2_500,
        (Mode::FreeText, DetailLevel::Detailed) => 3_500,
    };
    let scaled = match mode {
        Mode::Structured => base + count.saturating_sub(DEFAULT_COUNT) * TOKENS_PER_EXTRA_RECORD,
        Mode::FreeText => base,
    };
    scaled.min(MAX_OUTPUT_TOKENS)
}

/// Build the upstream request body.
pub fn build(request: &GenerationRequest, model: &ResolvedModel) -> Result<ResponsesRequest> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(GatewayError::invalid_request("Missing prompt."));
    }
    let prompt = truncate_chars(prompt, MAX_PROMPT_CHARS);

    let count = effective_count(request);
    let detail = request.detail_level.unwrap_or_default();
    let include_extras = request.include_extras.unwrap_or(false);

    let system = system_instruction(request, count, detail, include_extras);
    let temperature = match request.mode {
        Mode::Structured => STRUCTURED_TEMPERATURE,
        Mode::FreeText => FREE_TEXT_TEMPERATURE,
    };

    Ok(ResponsesRequest {
        model: model.as_str().to_string(),
        input: vec![
            InputMessage {
                role: "system".to_string(),
                content: MessageContent::Text(system),
            },
            InputMessage {
                role: "user".to_string(),
                content: MessageContent::Blocks(vec![InputBlock::input_text(prompt)]),
            },
        ],
        temperature,
        max_output_tokens: output_cap(request.mode, detail, count),
    })
}

fn system_instruction(
    request: &GenerationRequest,
    count: u32,
    detail: DetailLevel,
    include_extras: bool,
) -> String {
    let detail_line = match detail {
        DetailLevel::Brief => prompts::DETAIL_BRIEF,
        DetailLevel::Standard => prompts::DETAIL_STANDARD,
        DetailLevel::Detailed => prompts::DETAIL_DETAILED,
    };
    let count = count.to_string();

    let rendered = match request.mode {
        Mode::Structured => {
            let collection = request.shape.unwrap_or(ResultShape::Ideas).collection_key();
            let extras = if include_extras {
                prompts::EXTRAS_STRUCTURED
            } else {
                prompts::EXTRAS_STRUCTURED_NONE
            };
            prompts::render(
                prompts::STRUCTURED_SYSTEM,
                &[
                    ("collection", collection),
                    ("count", &count),
                    ("detail", detail_line),
                    ("extras", extras),
                ],
            )
        }
        Mode::FreeText => {
            let extras = if include_extras {
                prompts::EXTRAS_FREE_TEXT
            } else {
                ""
            };
            prompts::render(
                prompts::FREE_TEXT_SYSTEM,
                &[("count", &count), ("detail", detail_line), ("extras", extras)],
            )
        }
    };
    rendered.trim_end().to_string()
}
