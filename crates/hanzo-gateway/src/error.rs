//! Error types for Hanzo Gateway

use crate::types::PolicyAction;
use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway error types
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request carried no tenant identifier
    #[error("Missing tenant identifier")]
    MissingTenant,

    /// Request body could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local injection screening flagged the prompt
    #[error("Prompt rejected (injection keyword: {reason})")]
    InjectionRejected { reason: String },

    /// The policy-decision service denied the request
    #[error("Denied by policy: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Denied {
        policy_id: Option<String>,
        reason: Option<String>,
        action: PolicyAction,
        score: f64,
    },

    /// Policy-decision service unreachable or timed out
    #[error("Policy service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Policy-decision service answered with a non-success status
    #[error("Policy service returned status {status}")]
    UpstreamError { status: u16 },

    /// Inference backend did not answer within its timeout
    #[error("Inference backend timed out")]
    BackendTimeout,

    /// Inference backend failed or answered with a non-success status
    #[error("Inference backend error (status: {status:?}): {detail}")]
    BackendError { status: Option<u16>, detail: String },

    /// Pipeline-level wrapper for any backend failure
    #[error("Downstream model error: {0}")]
    BackendUnavailable(String),

    /// Durable append of an audit record failed
    #[error("Audit write failed: {0}")]
    AuditWriteFailed(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Request task ended abnormally
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status equivalent of this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingTenant | GatewayError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::InjectionRejected { .. } | GatewayError::Denied { .. } => {
                StatusCode::FORBIDDEN
            }
            GatewayError::UpstreamUnavailable(_)
            | GatewayError::UpstreamError { .. }
            | GatewayError::BackendTimeout
            | GatewayError::BackendError { .. }
            | GatewayError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::AuditWriteFailed(_)
            | GatewayError::Serialization(_)
            | GatewayError::Config(_)
            | GatewayError::HttpClient(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for error payloads
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::MissingTenant => "missing_tenant",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::InjectionRejected { .. } => "injection_rejected",
            GatewayError::Denied { .. } => "policy_denied",
            GatewayError::UpstreamUnavailable(_) => "policy_unavailable",
            GatewayError::UpstreamError { .. } => "policy_error",
            GatewayError::BackendTimeout => "backend_timeout",
            GatewayError::BackendError { .. } => "backend_error",
            GatewayError::BackendUnavailable(_) => "backend_unavailable",
            GatewayError::AuditWriteFailed(_) => "audit_write_failed",
            GatewayError::Serialization(_) => "serialization_error",
            GatewayError::Config(_) => "config_error",
            GatewayError::HttpClient(_) => "http_client_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Error class for payloads: client, policy, dependency or internal
    pub fn error_type(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "invalid_request_error",
            StatusCode::FORBIDDEN => "policy_error",
            StatusCode::BAD_GATEWAY => "dependency_error",
            _ => "server_error",
        }
    }

    /// Message safe to return to the caller; internal detail stays in logs
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::BackendTimeout
            | GatewayError::BackendError { .. }
            | GatewayError::BackendUnavailable(_) => "Downstream model error".to_string(),
            GatewayError::UpstreamUnavailable(_) | GatewayError::UpstreamError { .. } => {
                "Policy service error".to_string()
            }
            GatewayError::AuditWriteFailed(_)
            | GatewayError::Serialization(_)
            | GatewayError::Config(_)
            | GatewayError::HttpClient(_)
            | GatewayError::Internal(_) => "Internal gateway error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error is a failure of the inference backend
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::BackendTimeout
                | GatewayError::BackendError { .. }
                | GatewayError::BackendUnavailable(_)
        )
    }
}
