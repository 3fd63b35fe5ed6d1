//! Request mediation pipeline
//!
//! Per request: tenant check, local injection screening, optional inline
//! authorization, backend call, output redaction. Exactly one audit record is
//! written after the outcome is decided, whatever that outcome is.
//!
//! Screening runs before the policy service is consulted, so a flagged prompt
//! is rejected without reaching any external dependency. The two checks stay
//! independent: a prompt must pass both.

use crate::audit::{AuditSink, JsonlAuditSink};
use crate::authz::{Authorizer, PolicyClient};
use crate::backend::{BackendClient, InferenceBackend};
use crate::config::{AuditFailurePolicy, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::injection::InjectionScreener;
use crate::redact::Redactor;
use crate::types::{AuditRecord, PendingRecord, PromptRequest};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Orchestrates the per-request checks around the inference backend
pub struct MediationPipeline {
    authorizer: Option<Arc<dyn Authorizer>>,
    screener: InjectionScreener,
    backend: Arc<dyn InferenceBackend>,
    redactor: Redactor,
    audit: Arc<dyn AuditSink>,
    audit_failure: AuditFailurePolicy,
}

impl MediationPipeline {
    /// Pipeline with default screening and redaction and no inline
    /// authorization
    pub fn new(backend: Arc<dyn InferenceBackend>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            authorizer: None,
            screener: InjectionScreener::default(),
            backend,
            redactor: Redactor::new(),
            audit,
            audit_failure: AuditFailurePolicy::Log,
        }
    }

    /// Build the production pipeline from configuration
    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        let backend = Arc::new(BackendClient::new(config.backend.clone())?);
        let audit = Arc::new(JsonlAuditSink::open(&config.audit.path).await?);

        let mut pipeline = Self::new(backend, audit)
            .with_screener(InjectionScreener::new(config.injection.clone()))
            .with_audit_failure_policy(config.audit.on_failure);

        if config.authorization.inline {
            let authorizer = Arc::new(PolicyClient::new(config.authorization.clone())?);
            pipeline = pipeline.with_authorizer(authorizer);
        }

        Ok(pipeline)
    }

    /// Consult the policy service for every request before the backend call
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_screener(mut self, screener: InjectionScreener) -> Self {
        self.screener = screener;
        self
    }

    pub fn with_audit_failure_policy(mut self, policy: AuditFailurePolicy) -> Self {
        self.audit_failure = policy;
        self
    }

    /// Mediate one request; returns the redacted backend output
    pub async fn handle(&self, request: PromptRequest) -> Result<String> {
        let Some(tenant) = request.tenant().map(str::to_owned) else {
            warn!("request without tenant rejected");
            return Err(GatewayError::MissingTenant);
        };

        let request_id = Uuid::new_v4();
        let span = info_span!("mediate", %request_id, tenant_id = %tenant);

        async move {
            let screen = self.screener.screen(&request.prompt);
            let pending = AuditRecord::open(&tenant, &request.prompt, Utc::now().timestamp())
                .with_injection(screen.flagged, screen.matched_term.clone());

            let (record, outcome) = match screen.matched_term {
                Some(term) => {
                    warn!(matched_term = %term, "prompt rejected by injection screen");
                    (
                        pending.deny(),
                        Err(GatewayError::InjectionRejected { reason: term }),
                    )
                }
                None => self.mediate(&tenant, &request.prompt, pending).await,
            };

            info!(decision = %record.decision, "request mediated");
            self.finish(record, outcome).await
        }
        .instrument(span)
        .await
    }

    /// Authorization, backend call and redaction for a screened prompt
    async fn mediate(
        &self,
        tenant: &str,
        prompt: &str,
        pending: PendingRecord,
    ) -> (AuditRecord, Result<String>) {
        if let Some(authorizer) = &self.authorizer {
            match authorizer.authorize(tenant, prompt).await {
                Ok(verdict) => {
                    info!(action = %verdict.action, policy_id = ?verdict.policy_id, "authorized");
                }
                Err(e @ GatewayError::Denied { .. }) => {
                    warn!(error = %e, "request denied by policy service");
                    return (pending.deny(), Err(e));
                }
                Err(e) => {
                    error!(error = %e, "policy service failure");
                    return (pending.error(), Err(e));
                }
            }
        }

        let output = match self.backend.generate(prompt).await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "inference backend failure");
                return (
                    pending.error(),
                    Err(GatewayError::BackendUnavailable(e.to_string())),
                );
            }
        };

        let (redacted, report) = self.redactor.redact_with_report(&output);
        if !report.is_empty() {
            info!(redactions = ?report, "backend output redacted");
        }

        (pending.allow(redacted.clone()), Ok(redacted))
    }

    /// Write the audit record, then hand back the outcome
    async fn finish(&self, record: AuditRecord, outcome: Result<String>) -> Result<String> {
        let Err(audit_err) = self.audit.record(&record).await else {
            return outcome;
        };

        error!(
            target: "hanzo_gateway::audit",
            error = %audit_err,
            decision = %record.decision,
            tenant_id = %record.tenant_id,
            "audit write failed"
        );

        match (self.audit_failure, outcome) {
            (AuditFailurePolicy::Fail, Ok(_)) => Err(audit_err),
            (_, outcome) => outcome,
        }
    }
}
