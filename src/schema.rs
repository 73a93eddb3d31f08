//! Structured-output validation
//!
//! Parses model output as JSON, checks for the mandatory top-level collection and
//! normalizes each record. Parsing and the shape check can fail; normalization is
//! total over any JSON value.

use crate::models::{GenerationRequest, ProjectIdea, ResultShape, ValidatedResult};
use crate::payload::effective_count;
use crate::{ErrorKind, GatewayError, Result};
use serde_json::{Map, Value};

pub const MAX_LIST_ENTRIES: usize = 6;
pub const UNTITLED: &str = "Untitled Project";
pub const NOT_SPECIFIED: &str = "Not specified";

const INVALID_JSON_MESSAGE: &str =
    "Model did not return valid JSON. Lower idea count/detail level and try again.";

/// What structured output must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedShape {
    pub collection: ResultShape,
    pub max_records: usize,
}

impl ExpectedShape {
    pub fn new(collection: ResultShape, max_records: usize) -> Self {
        Self {
            collection,
            max_records,
        }
    }

    pub fn for_request(request: &GenerationRequest) -> Self {
        Self::new(
            request.shape.unwrap_or_default(),
            effective_count(request) as usize,
        )
    }
}

/// Parse and normalize structured model output.
pub fn validate(text: &str, shape: &ExpectedShape) -> Result<ValidatedResult> {
    let parsed: Value = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
        tracing::error!("Model output is not valid JSON: {}", e);
        GatewayError::new(ErrorKind::InvalidModelOutput, INVALID_JSON_MESSAGE).with_details(text)
    })?;

    let key = shape.collection.collection_key();
    let records = parsed
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            tracing::error!("Model output is missing the {} array", key);
            GatewayError::new(
                ErrorKind::SchemaMismatch,
                format!("JSON schema invalid: expected {{ {}: [...] }}", key),
            )
            .with_details(parsed.to_string())
        })?;

    if records.len() > shape.max_records {
        tracing::debug!(
            "Model returned {} records, keeping {}",
            records.len(),
            shape.max_records
        );
    }

    Ok(ValidatedResult {
        shape: shape.collection,
        records: records
            .iter()
            .take(shape.max_records)
            .map(normalize_record)
            .collect(),
    })
}

/// Strip one surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => strip_json_tag(body.trim()),
    }
}

/// Remove a leading `json` tag from a single-line fence body.
fn strip_json_tag(body: &str) -> &str {
    match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => body[4..].trim(),
        _ => body,
    }
}

fn normalize_record(value: &Value) -> ProjectIdea {
    let empty = Map::new();
    let record = value.as_object().unwrap_or(&empty);

    ProjectIdea {
        title: text_field(record, &["title", "name"], UNTITLED),
        summary: text_field(record, &["summary", "description"], ""),
        problem: text_field(record, &["problem"], ""),
        target_users: text_field(record, &["targetUsers", "target_users"], NOT_SPECIFIED),
        difficulty: text_field(record, &["difficulty"], NOT_SPECIFIED),
        timeline: text_field(record, &["timeline"], NOT_SPECIFIED),
        features: list_field(record, &["features"]),
        tech_stack: list_field(record, &["techStack", "tech_stack"]),
        skills: list_field(record, &["skills"]),
        risks: list_field(record, &["risks"]),
        extras: list_field(record, &["extras"]),
    }
}

fn lookup<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key))
}

fn text_field(record: &Map<String, Value>, keys: &[&str], fallback: &str) -> String {
    match lookup(record, keys) {
        Some(Value::String(text)) => text.clone(),
        _ => fallback.to_string(),
    }
}

fn list_field(record: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let Some(Value::Array(entries)) = lookup(record, keys) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .take(MAX_LIST_ENTRIES)
        .collect()
}
