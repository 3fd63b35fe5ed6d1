//! Hanzo Gateway process
//!
//! Mediates tenant prompts to an inference backend:
//! - `POST /proxy`: screened, authorized, redacted and audited generation
//! - `POST /authorize`: external-authorization adapter for an edge proxy
//! - `GET /health`: liveness

use anyhow::{Context, Result};
use clap::Parser;
use hanzo_gateway::config::AuditFailurePolicy;
use hanzo_gateway::{router, AppState, GatewayConfig};
use std::path::PathBuf;
use tracing::info;

/// Gateway server arguments; flags override the config file
#[derive(Parser, Debug)]
#[command(name = "hanzo-gateway")]
#[command(about = "Request-mediation gateway for LLM inference")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "GATEWAY_LISTEN")]
    listen: Option<String>,

    /// Inference backend generation URL
    #[arg(long, env = "MODEL_URL")]
    backend_url: Option<String>,

    /// Policy-decision service URL
    #[arg(long, env = "OPA_DECISION_URL")]
    authz_url: Option<String>,

    /// Header carrying the tenant identifier
    #[arg(long, env = "TENANT_HEADER")]
    tenant_header: Option<String>,

    /// Audit log file
    #[arg(long, env = "AUDIT_FILE")]
    audit_file: Option<String>,

    /// Fail requests whose audit record could not be written
    #[arg(long)]
    strict_audit: bool,

    /// Skip the policy service inside /proxy (edge proxy calls /authorize)
    #[arg(long)]
    no_inline_authz: bool,
}

impl Args {
    fn into_config(self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GatewayConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(url) = self.backend_url {
            config.backend.url = url;
        }
        if let Some(url) = self.authz_url {
            config.authorization.url = url;
        }
        if let Some(header) = self.tenant_header {
            config.tenant_header = header;
        }
        if let Some(path) = self.audit_file {
            config.audit.path = path;
        }
        if self.strict_audit {
            config.audit.on_failure = AuditFailurePolicy::Fail;
        }
        if self.no_inline_authz {
            config.authorization.inline = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Args::parse().into_config()?;
    let state = AppState::from_config(&config)
        .await
        .context("initialising gateway")?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;

    info!(
        listen = %config.listen_addr,
        backend = %config.backend.url,
        authz = %config.authorization.url,
        inline_authz = config.authorization.inline,
        tenant_header = %config.tenant_header,
        audit = %config.audit.path,
        "Gateway listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
