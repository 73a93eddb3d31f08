use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ResponsesRequest};
use super::{IMAGES_PATH, RESPONSES_PATH};
use crate::ai::UpstreamService;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// [`UpstreamService`] backed by the OpenAI Responses and Images APIs.
#[derive(Clone, Default)]
pub struct OpenAiUpstream {
    http: OpenAiHttpClient,
}

impl OpenAiUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(client),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl UpstreamService for OpenAiUpstream {
    async fn create_response(
        &self,
        payload: &ResponsesRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value> {
        self.http
            .post(RESPONSES_PATH, payload, credential, deadline)
            .await
    }

    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value> {
        self.http
            .post(IMAGES_PATH, request, credential, deadline)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::openai::test_support::{self, TEST_KEY};
    use crate::models::{GenerationRequest, Mode};
    use crate::{payload, selector, ErrorKind};
    use std::time::Instant;
    use wiremock::matchers::{body_json, body_partial_json};
    use wiremock::{MockServer, ResponseTemplate};

    const DEADLINE: Duration = Duration::from_secs(5);

    fn make_upstream(server: &MockServer) -> OpenAiUpstream {
        OpenAiUpstream::new().with_base_url(server.uri())
    }

    fn sample_payload() -> ResponsesRequest {
        let request = GenerationRequest::new("build a campus app", Mode::Structured).with_count(2);
        payload::build(&request, &selector::resolve(Some("gpt-4o-mini"))).unwrap()
    }

    #[tokio::test]
    async fn test_create_response_returns_envelope() {
        let server = MockServer::start().await;

        test_support::post(RESPONSES_PATH)
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.4
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output_text": "hello"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let envelope = make_upstream(&server)
            .create_response(&sample_payload(), TEST_KEY, DEADLINE)
            .await
            .unwrap();
        assert_eq!(envelope["output_text"], "hello");
    }

    #[tokio::test]
    async fn test_rejected_status_is_passed_through() {
        let server = MockServer::start().await;

        test_support::post(RESPONSES_PATH)
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "rate limited" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = make_upstream(&server)
            .create_response(&sample_payload(), TEST_KEY, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamRejected);
        assert_eq!(err.message(), "rate limited");
        assert_eq!(err.status(), 429);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;

        test_support::post(RESPONSES_PATH)
            .respond_with(
                ResponseTemplate::new(504).set_body_string("<html>Gateway Timeout</html>"),
            )
            .mount(&server)
            .await;

        let err = make_upstream(&server)
            .create_response(&sample_payload(), TEST_KEY, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
        assert_eq!(err.status(), 502);
        assert_eq!(err.message(), "Upstream returned non-JSON (status 504).");
        assert!(err.details().unwrap().contains("<html>Gateway Timeout</html>"));
    }

    #[tokio::test]
    async fn test_long_non_json_body_excerpt_is_bounded() {
        let server = MockServer::start().await;

        test_support::post(RESPONSES_PATH)
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(5_000)))
            .mount(&server)
            .await;

        let err = make_upstream(&server)
            .create_response(&sample_payload(), TEST_KEY, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamMalformed);
        assert_eq!(err.details().unwrap().len(), crate::error::MAX_DETAIL_CHARS);
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_upstream() {
        let server = MockServer::start().await;

        test_support::post(RESPONSES_PATH)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "output_text": "too late" }))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let deadline = Duration::from_millis(200);
        let started = Instant::now();
        let err = make_upstream(&server)
            .create_response(&sample_payload(), TEST_KEY, deadline)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamTimeout);
        assert_eq!(err.status(), 504);
        assert!(started.elapsed() < deadline + Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_missing_credential_never_reaches_network() {
        let server = MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = make_upstream(&server)
            .create_response(&sample_payload(), "   ", DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        // Nothing listens on port 9 of localhost in the test environment.
        let upstream = OpenAiUpstream::new().with_base_url("http://127.0.0.1:9");
        let err = upstream
            .create_response(&sample_payload(), TEST_KEY, DEADLINE)
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamTimeout
        ));
        assert_eq!(err.status(), 504);
        assert!(!err.message().contains(TEST_KEY));
    }

    #[tokio::test]
    async fn test_generate_image_posts_to_images_endpoint() {
        let server = MockServer::start().await;

        test_support::post(IMAGES_PATH)
            .and(body_json(serde_json::json!({
                "model": "gpt-image-1",
                "prompt": "a lighthouse",
                "size": "512x512"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "b64_json": "iVBORw0KGgo=" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ImageGenerationRequest {
            model: "gpt-image-1".to_string(),
            prompt: "a lighthouse".to_string(),
            size: "512x512".to_string(),
        };
        let envelope = make_upstream(&server)
            .generate_image(&request, TEST_KEY, DEADLINE)
            .await
            .unwrap();
        assert_eq!(envelope["data"][0]["b64_json"], "iVBORw0KGgo=");
    }
}
