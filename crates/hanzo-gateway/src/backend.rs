//! Inference backend client

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Generates text for an approved prompt
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Single attempt, no retries
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    output: String,
}

/// HTTP client for the inference backend
pub struct BackendClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl InferenceBackend for BackendClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(url = %self.config.url, prompt_len = prompt.len(), "forwarding to backend");

        let response = self
            .client
            .post(&self.config.url)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::BackendTimeout
                } else {
                    GatewayError::BackendError {
                        status: None,
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::BackendError {
                status: Some(status.as_u16()),
                detail,
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::BackendTimeout
            } else {
                GatewayError::BackendError {
                    status: Some(status.as_u16()),
                    detail: format!("unreadable response: {}", e),
                }
            }
        })?;

        Ok(body.output)
    }
}
