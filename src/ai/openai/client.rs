use crate::ai::{require_credential, with_deadline};
use crate::error::Failure;
use crate::{GatewayError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Thin OpenAI REST transport. Holds no per-request state, so one instance can
/// serve any number of concurrent requests.
#[derive(Clone)]
pub struct OpenAiHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl OpenAiHttpClient {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// POST `request` to `path` and decode the body as JSON.
    ///
    /// The send and the body read are both raced against `deadline`. The body is
    /// read as text first so that non-JSON bodies surface as `UpstreamMalformed`
    /// rather than a decode error.
    pub async fn post<Req: Serialize + Sync>(
        &self,
        path: &str,
        request: &Req,
        credential: &str,
        deadline: Duration,
    ) -> Result<Value> {
        let credential = require_credential(credential)?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Sending request to OpenAI {} (deadline {:?})", path, deadline);

        let call = async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(credential)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("Failed to send request to OpenAI: {}", e);
                    Failure::Transport(e.without_url())
                })?;
            let status = response.status();
            let body = response.text().await.map_err(Failure::Transport)?;
            Ok::<_, GatewayError>((status, body))
        };
        let (status, body) = with_deadline(deadline, call).await?;

        let envelope: Value = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    "OpenAI returned non-JSON body (status {}): {}",
                    status,
                    e
                );
                return Err(Failure::NonJsonBody {
                    status: status.as_u16(),
                    raw: body,
                }
                .into());
            }
        };

        if !status.is_success() {
            tracing::error!("OpenAI API error (status {})", status);
            return Err(Failure::Rejected {
                status: status.as_u16(),
                body: envelope,
            }
            .into());
        }

        Ok(envelope)
    }
}

impl Default for OpenAiHttpClient {
    fn default() -> Self {
        Self::new()
    }
}
