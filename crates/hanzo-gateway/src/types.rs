//! Core types for Hanzo Gateway

use serde::{Deserialize, Serialize};

/// A prompt submitted by a tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Calling tenant; absent or empty means unidentified
    pub tenant_id: Option<String>,
    /// Raw prompt text
    pub prompt: String,
}

impl PromptRequest {
    /// Create a request for a known tenant
    pub fn new(tenant_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            prompt: prompt.into(),
        }
    }

    /// Create a request with no tenant attached
    pub fn anonymous(prompt: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            prompt: prompt.into(),
        }
    }

    /// The tenant identifier, trimmed, if present and not blank
    pub fn tenant(&self) -> Option<&str> {
        self.tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Action recommended by the policy-decision service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Allow,
    Mask,
    Deny,
}

impl PolicyAction {
    /// Parse an upstream action string; anything unrecognised is `Deny`
    pub fn parse(action: &str) -> Self {
        match action.trim().to_ascii_lowercase().as_str() {
            "allow" => PolicyAction::Allow,
            "mask" => PolicyAction::Mask,
            _ => PolicyAction::Deny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::Allow => "allow",
            PolicyAction::Mask => "mask",
            PolicyAction::Deny => "deny",
        }
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization verdict produced once per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub allow: bool,
    pub action: PolicyAction,
    pub policy_id: Option<String>,
    pub reason: Option<String>,
    pub score: f64,
}

impl Verdict {
    /// Fail-closed verdict used when the upstream answer cannot be trusted
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            action: PolicyAction::Deny,
            policy_id: None,
            reason: Some(reason.into()),
            score: 0.0,
        }
    }
}

/// Terminal outcome recorded for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    Error,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny => write!(f, "deny"),
            Decision::Error => write!(f, "error"),
        }
    }
}

/// Audit log entry, one per mediated request
///
/// `prompt` always holds the raw text. `response` is present only when
/// `decision` is `Allow`, and then only in redacted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub tenant_id: String,
    /// Epoch seconds
    pub timestamp: i64,
    pub prompt: String,
    pub injection_detected: bool,
    pub injection_reason: Option<String>,
    pub decision: Decision,
    pub response: Option<String>,
}

impl AuditRecord {
    /// Start a record for a request; the decision is filled in by one of the
    /// terminal constructors below.
    pub(crate) fn open(tenant_id: &str, prompt: &str, timestamp: i64) -> PendingRecord {
        PendingRecord {
            tenant_id: tenant_id.to_string(),
            timestamp,
            prompt: prompt.to_string(),
            injection_detected: false,
            injection_reason: None,
        }
    }
}

/// Audit record whose decision has not been finalized yet
#[derive(Debug, Clone)]
pub(crate) struct PendingRecord {
    tenant_id: String,
    timestamp: i64,
    prompt: String,
    injection_detected: bool,
    injection_reason: Option<String>,
}

impl PendingRecord {
    pub(crate) fn with_injection(mut self, flagged: bool, term: Option<String>) -> Self {
        self.injection_detected = flagged;
        self.injection_reason = term;
        self
    }

    pub(crate) fn allow(self, redacted: String) -> AuditRecord {
        self.finish(Decision::Allow, Some(redacted))
    }

    pub(crate) fn deny(self) -> AuditRecord {
        self.finish(Decision::Deny, None)
    }

    pub(crate) fn error(self) -> AuditRecord {
        self.finish(Decision::Error, None)
    }

    fn finish(self, decision: Decision, response: Option<String>) -> AuditRecord {
        AuditRecord {
            tenant_id: self.tenant_id,
            timestamp: self.timestamp,
            prompt: self.prompt,
            injection_detected: self.injection_detected,
            injection_reason: self.injection_reason,
            decision,
            response,
        }
    }
}
