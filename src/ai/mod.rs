//! Upstream generative-model integration
//!
//! [`UpstreamService`] is the seam between the pipeline and the network. The OpenAI
//! implementation lives in [`openai`]; [`MockUpstream`] serves canned envelopes for
//! tests and offline harnesses.

pub mod mock;
pub mod openai;

pub use mock::{MockReply, MockUpstream};
pub use openai::OpenAiUpstream;

use crate::error::{classify, Failure};
use crate::Result;
use async_trait::async_trait;
use openai::types::{ImageGenerationRequest, ResponsesRequest};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// One upstream call per method invocation, bounded by `deadline`. Implementations
/// never retry.
#[async_trait]
pub trait UpstreamService: Send + Sync {
    /// Call the text generation endpoint and return the decoded envelope.
    async fn create_response(
        &self,
        payload: &ResponsesRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value>;

    /// Call the image generation endpoint and return the decoded envelope.
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value>;
}

/// Reject a blank credential before any network attempt.
pub fn require_credential(credential: &str) -> Result<&str> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(classify(Failure::MissingCredential));
    }
    Ok(credential)
}

/// Race `call` against a `deadline` timer. Whichever finishes first wins; if the
/// timer wins, `call` is dropped, which cancels any in-flight request it owns.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        outcome = call => outcome,
        _ = tokio::time::sleep(deadline) => {
            tracing::warn!("Upstream call exceeded deadline of {:?}; cancelling", deadline);
            Err(classify(Failure::Deadline(deadline)))
        }
    }
}
