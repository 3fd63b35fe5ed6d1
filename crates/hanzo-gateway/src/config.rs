//! Configuration for Hanzo Gateway

use crate::error::{GatewayError, Result};
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration, built once at process start and shared by reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the inbound endpoint binds to
    pub listen_addr: String,
    /// Header carrying the tenant identifier
    pub tenant_header: String,
    /// Inference backend configuration
    pub backend: BackendConfig,
    /// Policy-decision service configuration
    pub authorization: AuthorizationConfig,
    /// Local injection screening configuration
    pub injection: InjectionConfig,
    /// Audit trail configuration
    pub audit: AuditConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            tenant_header: "x-tenant-id".to_string(),
            backend: BackendConfig::default(),
            authorization: AuthorizationConfig::default(),
            injection: InjectionConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check the values a running gateway depends on
    pub fn validate(&self) -> Result<()> {
        self.tenant_header_name()?;
        check_url("backend.url", &self.backend.url)?;
        check_url("authorization.url", &self.authorization.url)?;
        if self.backend.timeout_ms == 0 {
            return Err(GatewayError::Config(
                "backend.timeout_ms must be positive".into(),
            ));
        }
        if self.authorization.timeout_ms == 0 {
            return Err(GatewayError::Config(
                "authorization.timeout_ms must be positive".into(),
            ));
        }
        if self.audit.path.trim().is_empty() {
            return Err(GatewayError::Config("audit.path must not be empty".into()));
        }
        Ok(())
    }

    /// Tenant header as a typed, lower-cased header name
    pub fn tenant_header_name(&self) -> Result<HeaderName> {
        if self.tenant_header.trim().is_empty() {
            return Err(GatewayError::Config("tenant_header must not be empty".into()));
        }
        HeaderName::from_bytes(self.tenant_header.trim().to_ascii_lowercase().as_bytes())
            .map_err(|e| GatewayError::Config(format!("invalid tenant_header: {}", e)))
    }
}

fn check_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(GatewayError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

/// Inference backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Generation endpoint URL
    pub url: String,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/generate".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Policy-decision service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Decision endpoint URL
    pub url: String,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Consult the policy service inside the proxy pipeline as well as on
    /// the dedicated authorize endpoint
    pub inline: bool,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8181/v1/data/ai/authz/decision".to_string(),
            timeout_ms: 5_000,
            inline: true,
        }
    }
}

impl AuthorizationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Injection screening configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct InjectionConfig {
    /// Terms checked after the built-in vocabulary
    pub extra_terms: Vec<String>,
}

/// What to do when the audit append fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditFailurePolicy {
    /// Log the failure and still return the outcome to the caller
    #[default]
    Log,
    /// Fail the request with `AuditWriteFailed`
    Fail,
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Append-only JSON-lines file
    pub path: String,
    /// Behaviour on a failed append
    pub on_failure: AuditFailurePolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: "audit.log".to_string(),
            on_failure: AuditFailurePolicy::Log,
        }
    }
}
