//! # Hanzo Gateway
//!
//! Request-mediation gateway in front of an LLM inference endpoint.
//!
//! Every tenant prompt passes through the same sequence of checks before it
//! reaches the model, and every model answer is scrubbed before it reaches
//! the caller:
//!
//! - **Tenant identification**: requests without a tenant are rejected
//!   before any external call
//! - **Injection screening**: a local keyword backstop
//! - **Authorization**: delegated to an external policy-decision service,
//!   fail closed
//! - **Redaction**: SSNs, 12-digit IDs and email addresses replaced with
//!   placeholders
//! - **Audit**: one append-only JSON line per request, whatever the outcome
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hanzo_gateway::{GatewayConfig, MediationPipeline, PromptRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::default();
//!     let pipeline = MediationPipeline::from_config(&config).await?;
//!
//!     let answer = pipeline
//!         .handle(PromptRequest::new("tenant-a", "Summarise this ticket"))
//!         .await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐    ┌──────────────────────────────────┐    ┌─────────┐
//! │ Tenant │ ─► │ Hanzo Gateway                    │ ─► │ Backend │
//! └────────┘    │  tenant ─► screen ─► authorize   │    └─────────┘
//!               │  ─► backend ─► redact ─► audit   │         │
//!               └──────────────────────────────────┘ ◄───────┘
//!                      │                 │
//!                ┌─────▼─────┐     ┌─────▼─────┐
//!                │  Policy   │     │ Audit log │
//!                │  service  │     │ (JSONL)   │
//!                └───────────┘     └───────────┘
//! ```

pub mod audit;
pub mod authz;
pub mod backend;
pub mod config;
pub mod error;
pub mod injection;
pub mod pipeline;
pub mod redact;
pub mod server;
pub mod types;

pub use audit::{AuditSink, JsonlAuditSink, MemoryAuditSink};
pub use authz::{Authorizer, PolicyClient};
pub use backend::{BackendClient, InferenceBackend};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use injection::{InjectionScreener, ScreenResult};
pub use pipeline::MediationPipeline;
pub use redact::{redact, Redactor};
pub use server::{router, AppState};
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::AuditSink;
    pub use crate::authz::Authorizer;
    pub use crate::backend::InferenceBackend;
    pub use crate::config::GatewayConfig;
    pub use crate::error::{GatewayError, Result};
    pub use crate::pipeline::MediationPipeline;
    pub use crate::types::*;
}
