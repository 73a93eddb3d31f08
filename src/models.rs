//! Data models and structures
//!
//! Defines the inbound request types, the validated idea records, the outbound
//! response shapes and the process configuration consumed by the binary.

use crate::{GatewayError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[serde(alias = "text", alias = "freetext")]
    FreeText,
    #[default]
    #[serde(alias = "json")]
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    #[serde(alias = "low")]
    Brief,
    #[default]
    #[serde(alias = "medium")]
    Standard,
    #[serde(alias = "high")]
    Detailed,
}

/// Top-level collection the caller expects back in structured mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    #[default]
    Ideas,
    Projects,
}

impl ResultShape {
    pub fn collection_key(self) -> &'static str {
        match self {
            ResultShape::Ideas => "ideas",
            ResultShape::Projects => "projects",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: String,
    pub model: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    pub count: Option<u32>,
    pub detail_level: Option<DetailLevel>,
    pub include_extras: Option<bool>,
    pub shape: Option<ResultShape>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, mode: Mode) -> Self {
        Self {
            prompt: prompt.into(),
            mode,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_detail_level(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = Some(detail_level);
        self
    }

    pub fn with_extras(mut self, include_extras: bool) -> Self {
        self.include_extras = Some(include_extras);
        self
    }

    pub fn with_shape(mut self, shape: ResultShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
    pub size: Option<String>,
}

/// A model identifier that is known to be on the allow-list.
///
/// Only [`crate::selector::resolve`] can produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedModel(&'static str);

impl ResolvedModel {
    pub(crate) const fn from_allow_list(token: &'static str) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One normalized idea/project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdea {
    pub title: String,
    pub summary: String,
    pub problem: String,
    pub target_users: String,
    pub difficulty: String,
    pub timeline: String,
    pub features: Vec<String>,
    pub tech_stack: Vec<String>,
    pub skills: Vec<String>,
    pub risks: Vec<String>,
    pub extras: Vec<String>,
}

/// Structured-mode result, serialized as `{ "<collection>": [records...] }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedResult {
    pub shape: ResultShape,
    pub records: Vec<ProjectIdea>,
}

impl Serialize for ValidatedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.shape.collection_key(), &self.records)?;
        map.end()
    }
}

/// Successful outbound payloads, serialized by the HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GatewayResponse {
    Structured {
        #[serde(rename = "ideasJson")]
        ideas_json: ValidatedResult,
        #[serde(rename = "ideasText")]
        ideas_text: String,
        #[serde(rename = "modelUsed")]
        model_used: ResolvedModel,
    },
    Projects {
        projects: Vec<ProjectIdea>,
    },
    FreeText {
        #[serde(rename = "ideasText")]
        ideas_text: String,
        #[serde(rename = "modelUsed")]
        model_used: ResolvedModel,
    },
    Image {
        #[serde(rename = "imageDataUrl")]
        image_data_url: String,
    },
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 9_000;
const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 60_000;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub upstream_timeout: Duration,
    pub image_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("OPENAI_API_KEY")
            .or_else(|| lookup("openai_api_key"))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            api_key,
            base_url: lookup("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_timeout: millis_var(
                &lookup,
                "UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )?,
            image_timeout: millis_var(&lookup, "IMAGE_TIMEOUT_MS", DEFAULT_IMAGE_TIMEOUT_MS)?,
        })
    }
}

fn millis_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration> {
    match lookup(key) {
        None => Ok(Duration::from_millis(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| {
                GatewayError::configuration(format!(
                    "{} must be a whole number of milliseconds",
                    key
                ))
            }),
    }
}
