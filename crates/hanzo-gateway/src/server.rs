//! Inbound HTTP endpoints
//!
//! - `POST /proxy`: mediated generation for a tenant
//! - `POST /authorize`: external-authorization adapter for an edge proxy
//! - `GET /health`: liveness

use crate::authz::{Authorizer, PolicyClient};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::pipeline::MediationPipeline;
use crate::types::{PolicyAction, PromptRequest, Verdict};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Tenant used by `/authorize` when neither header nor body names one
const UNKNOWN_TENANT: &str = "unknown";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MediationPipeline>,
    pub authorizer: Arc<dyn Authorizer>,
    pub tenant_header: HeaderName,
}

impl AppState {
    /// Production state: HTTP clients and the JSON-lines audit file
    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pipeline: Arc::new(MediationPipeline::from_config(config).await?),
            authorizer: Arc::new(PolicyClient::new(config.authorization.clone())?),
            tenant_header: config.tenant_header_name()?,
        })
    }

    fn tenant_from(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.tenant_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
    }
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/proxy", post(proxy_handler))
        .route("/authorize", post(authorize_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
struct AuthorizeRequest {
    #[serde(default)]
    tenant: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

/// Verdict metadata returned to the caller or edge proxy
#[derive(Debug, Serialize, Deserialize)]
pub struct VerdictBody {
    pub allow: bool,
    pub policy_id: Option<String>,
    pub reason: Option<String>,
    pub action: PolicyAction,
    pub score: f64,
}

impl From<Verdict> for VerdictBody {
    fn from(v: Verdict) -> Self {
        Self {
            allow: v.allow,
            policy_id: v.policy_id,
            reason: v.reason,
            action: v.action,
            score: v.score,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verdict: Option<VerdictBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = ErrorDetail {
            message: self.public_message(),
            r#type: self.error_type().to_string(),
            code: self.error_code().to_string(),
        };
        let verdict = match self {
            GatewayError::Denied {
                policy_id,
                reason,
                action,
                score,
            } => Some(VerdictBody {
                allow: false,
                policy_id,
                reason,
                action,
                score,
            }),
            _ => None,
        };
        (status, Json(ErrorResponse { error, verdict })).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<ProxyRequest>, JsonRejection>,
) -> std::result::Result<Json<ProxyResponse>, GatewayError> {
    let Json(body) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let request = PromptRequest {
        tenant_id: state.tenant_from(&headers),
        prompt: body.prompt,
    };

    // Detached so the audit write completes even if the caller disconnects
    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(async move { pipeline.handle(request).await });

    match task.await {
        Ok(outcome) => outcome.map(|response| Json(ProxyResponse { response })),
        Err(e) => {
            error!(error = %e, "mediation task failed");
            Err(GatewayError::Internal(e.to_string()))
        }
    }
}

async fn authorize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, GatewayError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    let request: AuthorizeRequest = if is_json && !body.is_empty() {
        serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidRequest(e.to_string()))?
    } else {
        AuthorizeRequest::default()
    };

    let tenant = state
        .tenant_from(&headers)
        .or(request.tenant.filter(|t| !t.is_empty()))
        .unwrap_or_else(|| UNKNOWN_TENANT.to_string());
    let prompt = request.prompt.unwrap_or_default();

    let verdict = match state.authorizer.authorize(&tenant, &prompt).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(tenant_id = %tenant, error = %e, "authorization rejected");
            return Err(e);
        }
    };

    info!(
        tenant_id = %tenant,
        action = %verdict.action,
        policy_id = ?verdict.policy_id,
        "authorization granted"
    );

    let headers = decision_headers(&verdict);
    Ok((StatusCode::OK, headers, Json(VerdictBody::from(verdict))).into_response())
}

/// `x-auth-*` headers an edge proxy can forward upstream
fn decision_headers(verdict: &Verdict) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let mut set = |name: &'static str, value: &str| match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => warn!(header = name, "decision metadata not representable as a header"),
    };

    set("x-auth-allow", if verdict.allow { "true" } else { "false" });
    set("x-auth-action", verdict.action.as_str());
    set("x-auth-score", &verdict.score.to_string());
    if let Some(policy_id) = &verdict.policy_id {
        set("x-auth-policy-id", policy_id);
    }
    if let Some(reason) = &verdict.reason {
        set("x-auth-reason", reason);
    }
    headers
}
