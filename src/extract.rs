//! Response text extraction
//!
//! The Responses API envelope is not stable across models and API revisions. Text
//! may arrive as a flat `output_text` string, or nested as
//! `output[] -> content[] -> {type, text}`. Shapes are tried in priority order and a
//! missing shape simply means "try the next one".

use serde_json::Value;

const TEXT_BLOCK_TYPES: &[&str] = &["output_text", "text"];

/// Known envelope layouts, in priority order.
#[derive(Debug)]
enum EnvelopeShape<'a> {
    Flat(&'a str),
    Items(&'a [Value]),
    Unrecognized,
}

fn classify_shape(envelope: &Value) -> EnvelopeShape<'_> {
    if let Some(text) = envelope.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return EnvelopeShape::Flat(text);
        }
    }
    match envelope.get("output").and_then(Value::as_array) {
        Some(items) => EnvelopeShape::Items(items),
        None => EnvelopeShape::Unrecognized,
    }
}

/// Text carried by one content block.
#[derive(Debug, PartialEq)]
enum BlockText<'a> {
    Tagged(&'a str),
    Untagged(&'a str),
}

fn block_text(block: &Value) -> Option<BlockText<'_>> {
    let text = block.get("text").and_then(Value::as_str)?;
    match block.get("type").and_then(Value::as_str) {
        Some(kind) if TEXT_BLOCK_TYPES.contains(&kind) => Some(BlockText::Tagged(text)),
        _ => Some(BlockText::Untagged(text)),
    }
}

fn collect_item(item: &Value, fragments: &mut Vec<String>) {
    let Some(blocks) = item.get("content").and_then(Value::as_array) else {
        // Some revisions put the text directly on the item.
        if let Some(BlockText::Tagged(text) | BlockText::Untagged(text)) = block_text(item) {
            fragments.push(text.to_string());
        }
        return;
    };

    for block in blocks {
        match block_text(block) {
            Some(BlockText::Tagged(text)) => fragments.push(text.to_string()),
            Some(BlockText::Untagged(text)) => {
                tracing::debug!(
                    "Accepting text block without a recognized type: {:?}",
                    block.get("type")
                );
                fragments.push(text.to_string());
            }
            None => {}
        }
    }
}

/// Flatten every text-bearing part of `envelope` into one trimmed string.
///
/// An empty string means upstream produced no usable text; it is not an error here.
pub fn extract(envelope: &Value) -> String {
    match classify_shape(envelope) {
        EnvelopeShape::Flat(text) => text.trim().to_string(),
        EnvelopeShape::Items(items) => {
            let mut fragments = Vec::new();
            for item in items {
                collect_item(item, &mut fragments);
            }
            fragments.join("\n").trim().to_string()
        }
        EnvelopeShape::Unrecognized => {
            tracing::warn!("Upstream envelope has neither output_text nor output items");
            String::new()
        }
    }
}
