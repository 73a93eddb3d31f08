//! Request pipeline: model selection, payload building, the bounded upstream call,
//! text extraction and structured-output validation.

use crate::ai::openai::image;
use crate::ai::{require_credential, OpenAiUpstream, UpstreamService};
use crate::extract::extract;
use crate::models::{
    Config, GatewayResponse, GenerationRequest, ImageRequest, Mode, ResultShape,
};
use crate::schema::{self, ExpectedShape};
use crate::{payload, selector, ErrorKind, GatewayError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(9_000);
pub const DEFAULT_IMAGE_DEADLINE: Duration = Duration::from_secs(60);

/// Runs generation requests against one upstream. Holds only immutable state, so a
/// single instance can serve concurrent requests.
pub struct Gateway {
    upstream: Box<dyn UpstreamService>,
    deadline: Duration,
    image_deadline: Duration,
}

impl Gateway {
    pub fn new(upstream: Box<dyn UpstreamService>) -> Self {
        Self {
            upstream,
            deadline: DEFAULT_DEADLINE,
            image_deadline: DEFAULT_IMAGE_DEADLINE,
        }
    }

    /// Build a gateway talking to the OpenAI API described by `config`.
    pub fn from_config(config: &Config) -> Self {
        info!("Upstream: {} (deadline {:?})", config.base_url, config.upstream_timeout);
        Self::new(Box::new(
            OpenAiUpstream::new().with_base_url(config.base_url.clone()),
        ))
        .with_deadline(config.upstream_timeout)
        .with_image_deadline(config.image_timeout)
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_image_deadline(mut self, deadline: Duration) -> Self {
        self.image_deadline = deadline;
        self
    }

    /// Generate ideas for `request`. Every failure comes back as a [`GatewayError`]
    /// with the credential scrubbed from it.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GatewayResponse> {
        let span = tracing::info_span!(
            "generate",
            request_id = %Uuid::new_v4(),
            mode = ?request.mode
        );
        self.run_generate(request, credential)
            .instrument(span)
            .await
            .map_err(|e| report(e, credential))
    }

    /// Generate one image for `request`.
    pub async fn generate_image(
        &self,
        request: &ImageRequest,
        credential: &str,
    ) -> Result<GatewayResponse> {
        let span = tracing::info_span!("generate_image", request_id = %Uuid::new_v4());
        self.run_generate_image(request, credential)
            .instrument(span)
            .await
            .map_err(|e| report(e, credential))
    }

    async fn run_generate(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GatewayResponse> {
        let model = selector::resolve(request.model.as_deref());
        let payload = payload::build(request, &model)?;
        let credential = require_credential(credential)?;

        let envelope = self
            .upstream
            .create_response(&payload, credential, self.deadline)
            .await?;

        let text = extract(&envelope);
        if text.is_empty() {
            return Err(empty_output(&envelope));
        }
        info!("Upstream returned {} chars from {}", text.len(), model);

        match request.mode {
            Mode::FreeText => Ok(GatewayResponse::FreeText {
                ideas_text: text,
                model_used: model,
            }),
            Mode::Structured => {
                let result = schema::validate(&text, &ExpectedShape::for_request(request))?;
                info!("Validated {} records", result.records.len());
                match result.shape {
                    ResultShape::Ideas => Ok(GatewayResponse::Structured {
                        ideas_json: result,
                        ideas_text: text,
                        model_used: model,
                    }),
                    ResultShape::Projects => Ok(GatewayResponse::Projects {
                        projects: result.records,
                    }),
                }
            }
        }
    }

    async fn run_generate_image(
        &self,
        request: &ImageRequest,
        credential: &str,
    ) -> Result<GatewayResponse> {
        let image_request = image::build_request(request)?;
        let credential = require_credential(credential)?;

        let envelope = self
            .upstream
            .generate_image(&image_request, credential, self.image_deadline)
            .await?;

        let image_data_url = image::data_url(&envelope)?;
        info!("Upstream returned image ({} chars as data URL)", image_data_url.len());
        Ok(GatewayResponse::Image { image_data_url })
    }
}

fn empty_output(envelope: &Value) -> GatewayError {
    GatewayError::new(ErrorKind::EmptyUpstreamOutput, "OpenAI returned empty text.")
        .with_details(envelope.to_string())
}

fn report(err: GatewayError, credential: &str) -> GatewayError {
    let err = err.redact(credential);
    warn!("Request failed ({:?}, status {}): {}", err.kind(), err.status(), err.message());
    err
}

fn serialization_failure(e: serde_json::Error) -> GatewayError {
    warn!("Failed to serialize response: {}", e);
    GatewayError::new(ErrorKind::Internal, "Server error.").with_details(e.to_string())
}

/// Status and body for the HTTP collaborator to send.
pub fn into_http(outcome: &Result<GatewayResponse>) -> (u16, Value) {
    match outcome {
        Ok(response) => match serde_json::to_value(response) {
            Ok(body) => (200, body),
            Err(e) => {
                let err = serialization_failure(e);
                (err.status(), err.to_body())
            }
        },
        Err(err) => (err.status(), err.to_body()),
    }
}
