mod analysis;
mod config;
mod errors;
mod routes;
mod state;
mod workflow_client;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::workflow_client::WorkflowClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fitcheck v{}", env!("CARGO_PKG_VERSION"));

    let workflow = WorkflowClient::from_config(&config)?;
    match config.request_timeout {
        Some(timeout) => info!(
            "Workflow client initialized ({}, timeout {}s)",
            workflow.run_url(),
            timeout.as_secs()
        ),
        None => info!("Workflow client initialized ({}, no timeout)", workflow.run_url()),
    }
    info!("Response format policy: {}", config.format_policy);

    let state = AppState::new(&config, Arc::new(workflow));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
