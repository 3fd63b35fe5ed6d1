//! Development inference backend
//!
//! Echoes the prompt with a fixed contact line so redaction is visible end to
//! end when running the gateway locally.

use anyhow::Result;
use axum::{routing::post, Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hanzo-mock-model")]
#[command(about = "Echo backend for local gateway development")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Simulated generation latency in milliseconds
    #[arg(long, default_value = "100")]
    latency_ms: u64,
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
}

#[derive(Serialize)]
struct GenerateResponse {
    output: String,
}

fn echo(prompt: &str) -> String {
    format!(
        "Echo: {} -- contact: alice@example.com -- ssn: 123-45-6789",
        prompt
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let latency = Duration::from_millis(args.latency_ms);

    let app = Router::new().route(
        "/generate",
        post(move |Json(request): Json<GenerateRequest>| async move {
            tokio::time::sleep(latency).await;
            Json(GenerateResponse {
                output: echo(&request.prompt),
            })
        }),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    info!(port = args.port, "Mock model listening");

    axum::serve(listener, app).await?;

    Ok(())
}
