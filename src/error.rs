//! Error taxonomy and classification
//!
//! Every failure inside the gateway is converted into a [`GatewayError`] before it
//! leaves the core. Raw failure sources are collected in [`Failure`] and mapped to the
//! canonical `{kind, message, status}` triple by [`classify`].

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Upper bound (in characters) for any diagnostic detail attached to an error.
pub const MAX_DETAIL_CHARS: usize = 300;

const TIMEOUT_MESSAGE: &str = "Upstream timed out. Reduce idea count/detail level and try again.";
const REDACTED: &str = "[redacted]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ConfigurationError,
    UpstreamTimeout,
    UpstreamUnavailable,
    UpstreamMalformed,
    UpstreamRejected,
    EmptyUpstreamOutput,
    InvalidModelOutput,
    SchemaMismatch,
    /// Gateway-side fault unrelated to upstream or caller input.
    Internal,
}

impl ErrorKind {
    /// Canonical HTTP status for the kind. `UpstreamRejected` normally carries the
    /// upstream's own status instead.
    pub fn status_hint(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::ConfigurationError
            | ErrorKind::EmptyUpstreamOutput
            | ErrorKind::InvalidModelOutput
            | ErrorKind::SchemaMismatch
            | ErrorKind::Internal => 500,
            ErrorKind::UpstreamMalformed | ErrorKind::UpstreamRejected => 502,
            ErrorKind::UpstreamTimeout | ErrorKind::UpstreamUnavailable => 504,
        }
    }
}

/// The only error type that crosses the core boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct GatewayError {
    kind: ErrorKind,
    message: String,
    status: u16,
    details: Option<String>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: kind.status_hint(),
            details: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationError, message)
    }

    /// Attach diagnostic detail, truncated to [`MAX_DETAIL_CHARS`].
    pub fn with_details(mut self, details: impl AsRef<str>) -> Self {
        self.details = Some(truncate_chars(details.as_ref(), MAX_DETAIL_CHARS));
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Replace every occurrence of `secret` in the message and details.
    pub fn redact(mut self, secret: &str) -> Self {
        let secret = secret.trim();
        if secret.is_empty() {
            return self;
        }
        if self.message.contains(secret) {
            self.message = self.message.replace(secret, REDACTED);
        }
        if let Some(details) = self.details.take() {
            self.details = Some(details.replace(secret, REDACTED));
        }
        self
    }

    /// Outbound failure body: `{ "error": { "message": ..., "details": ... } }`.
    pub fn to_body(&self) -> Value {
        let mut error = json!({ "message": self.message });
        if let Some(details) = &self.details {
            error["details"] = Value::String(details.clone());
        }
        json!({ "error": error })
    }
}

/// Raw failure sources observed while talking to upstream.
#[derive(Error, Debug)]
pub enum Failure {
    #[error("API credential is missing")]
    MissingCredential,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream deadline of {0:?} elapsed")]
    Deadline(Duration),

    #[error("Upstream returned non-JSON body (status {status})")]
    NonJsonBody { status: u16, raw: String },

    #[error("Upstream rejected request (status {status})")]
    Rejected { status: u16, body: Value },
}

/// Map a raw failure onto the gateway taxonomy.
pub fn classify(failure: Failure) -> GatewayError {
    match failure {
        Failure::MissingCredential => GatewayError::configuration(
            "API key not configured. Set OPENAI_API_KEY in the environment.",
        ),
        Failure::Deadline(_) => GatewayError::new(ErrorKind::UpstreamTimeout, TIMEOUT_MESSAGE),
        Failure::Transport(e) if e.is_timeout() => {
            GatewayError::new(ErrorKind::UpstreamTimeout, TIMEOUT_MESSAGE)
        }
        Failure::Transport(e) => {
            GatewayError::new(ErrorKind::UpstreamUnavailable, "Upstream request failed.")
                .with_details(e.without_url().to_string())
        }
        Failure::NonJsonBody { status, raw } => GatewayError::new(
            ErrorKind::UpstreamMalformed,
            format!("Upstream returned non-JSON (status {}).", status),
        )
        .with_details(raw),
        Failure::Rejected { status, body } => {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .or_else(|| body.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| format!("OpenAI API error ({})", status));
            GatewayError::new(ErrorKind::UpstreamRejected, message)
                .with_status(status)
                .with_details(body.to_string())
        }
    }
}

impl From<Failure> for GatewayError {
    fn from(failure: Failure) -> Self {
        classify(failure)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        classify(Failure::Transport(e))
    }
}

/// Keep the first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
