use super::openai::types::{ImageGenerationRequest, ResponsesRequest};
use super::{require_credential, with_deadline, UpstreamService};
use crate::{GatewayError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned outcome for one mock upstream call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Envelope(Value),
    Error(GatewayError),
    /// Never answers; the caller's deadline decides the outcome.
    Hang,
}

/// In-memory [`UpstreamService`]. Replies are served in order and cycle once
/// exhausted; every request body is recorded for inspection.
#[derive(Clone)]
pub struct MockUpstream {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn with_envelope(self, envelope: Value) -> Self {
        self.with_reply(MockReply::Envelope(envelope))
    }

    /// Shorthand for an envelope whose only output is `text` in one content block.
    pub fn with_output_text(self, text: &str) -> Self {
        self.with_envelope(json!({
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": text }]
            }]
        }))
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Request bodies seen so far, serialized as JSON.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: Value) -> MockReply {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(request);

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            MockReply::Envelope(json!({ "output_text": "Mock idea" }))
        } else {
            replies[(*count - 1) % replies.len()].clone()
        }
    }

    async fn serve(&self, request: Value, credential: &str, deadline: Duration) -> Result<Value> {
        require_credential(credential)?;
        let reply = self.next_reply(request);
        with_deadline(deadline, async move {
            match reply {
                MockReply::Envelope(envelope) => Ok(envelope),
                MockReply::Error(err) => Err(err),
                MockReply::Hang => std::future::pending().await,
            }
        })
        .await
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamService for MockUpstream {
    async fn create_response(
        &self,
        payload: &ResponsesRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value> {
        let request = serde_json::to_value(payload).unwrap_or(Value::Null);
        self.serve(request, credential, deadline).await
    }

    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value> {
        let request = serde_json::to_value(request).unwrap_or(Value::Null);
        self.serve(request, credential, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn image_request() -> ImageGenerationRequest {
        ImageGenerationRequest {
            model: "gpt-image-1".to_string(),
            prompt: "p".to_string(),
            size: "1024x1024".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_cycles_replies() {
        let mock = MockUpstream::new()
            .with_envelope(json!({ "n": 1 }))
            .with_envelope(json!({ "n": 2 }));
        let deadline = Duration::from_secs(1);

        let first = mock.generate_image(&image_request(), "k", deadline).await.unwrap();
        let second = mock.generate_image(&image_request(), "k", deadline).await.unwrap();
        let third = mock.generate_image(&image_request(), "k", deadline).await.unwrap();

        assert_eq!(first["n"], 1);
        assert_eq!(second["n"], 2);
        assert_eq!(third["n"], 1);
        assert_eq!(mock.get_call_count(), 3);
        assert_eq!(mock.requests()[0]["model"], "gpt-image-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_hang_hits_deadline() {
        let mock = MockUpstream::new().with_reply(MockReply::Hang);
        let err = mock
            .generate_image(&image_request(), "k", Duration::from_secs(8))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamTimeout);
    }

    #[tokio::test]
    async fn test_mock_requires_credential() {
        let mock = MockUpstream::new();
        let err = mock
            .generate_image(&image_request(), "", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(mock.get_call_count(), 0);
    }
}
