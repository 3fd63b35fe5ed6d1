//! Authorization delegated to an external policy-decision service
//!
//! Any answer the client cannot read with certainty resolves to deny.

use crate::config::AuthorizationConfig;
use crate::error::{GatewayError, Result};
use crate::types::{PolicyAction, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Source of allow/deny verdicts for a tenant and prompt
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns the verdict when allowed; fails with `Denied` otherwise
    async fn authorize(&self, tenant_id: &str, prompt: &str) -> Result<Verdict>;
}

/// Request body sent to the decision endpoint
#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    input: DecisionInput<'a>,
}

#[derive(Debug, Serialize)]
struct DecisionInput<'a> {
    tenant: &'a str,
    prompt: &'a str,
}

/// Response body from the decision endpoint
#[derive(Debug, Default, Deserialize)]
struct DecisionResponse {
    #[serde(default)]
    result: Option<RawVerdict>,
}

/// Verdict fields as the service sends them; all optional
#[derive(Debug, Default, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    allow: Option<bool>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    policy_id: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl From<RawVerdict> for Verdict {
    fn from(raw: RawVerdict) -> Self {
        Verdict {
            allow: raw.allow.unwrap_or(false),
            action: raw
                .action
                .as_deref()
                .map(PolicyAction::parse)
                .unwrap_or(PolicyAction::Deny),
            policy_id: raw.policy_id,
            reason: raw.reason,
            score: raw.score.filter(|s| s.is_finite()).unwrap_or(0.0),
        }
    }
}

/// Read a decision body, falling back to deny for anything malformed
pub fn interpret_decision(body: &[u8]) -> Verdict {
    match serde_json::from_slice::<DecisionResponse>(body) {
        Ok(DecisionResponse { result: Some(raw) }) => raw.into(),
        Ok(DecisionResponse { result: None }) => Verdict::deny("policy decision missing result"),
        Err(e) => {
            warn!(error = %e, "malformed policy decision, denying");
            Verdict::deny("malformed policy decision")
        }
    }
}

/// Turn a verdict into the gateway's accept/reject signal
pub fn enforce(verdict: Verdict) -> Result<Verdict> {
    if verdict.allow {
        Ok(verdict)
    } else {
        Err(GatewayError::Denied {
            policy_id: verdict.policy_id,
            reason: verdict.reason,
            action: verdict.action,
            score: verdict.score,
        })
    }
}

/// HTTP client for the policy-decision service
pub struct PolicyClient {
    config: AuthorizationConfig,
    client: reqwest::Client,
}

impl PolicyClient {
    pub fn new(config: AuthorizationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl Authorizer for PolicyClient {
    async fn authorize(&self, tenant_id: &str, prompt: &str) -> Result<Verdict> {
        let request = DecisionRequest {
            input: DecisionInput {
                tenant: tenant_id,
                prompt,
            },
        };

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::UpstreamUnavailable(format!(
                        "timed out after {}ms",
                        self.config.timeout_ms
                    ))
                } else {
                    GatewayError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::UpstreamError {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("reading decision: {}", e)))?;

        let verdict = interpret_decision(&body);
        debug!(
            tenant_id,
            allow = verdict.allow,
            action = %verdict.action,
            policy_id = ?verdict.policy_id,
            score = verdict.score,
            "policy decision"
        );

        enforce(verdict)
    }
}
