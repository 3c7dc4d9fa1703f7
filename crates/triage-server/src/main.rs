//! HTTP server entry point.
//!
//! Loads configuration, builds the three pipelines and the guardrail once,
//! and serves the Axum router.

mod app;
mod dto;
mod error;
mod extract;
mod handlers;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use triage_config::ServiceConfig;
use triage_engine::Agents;
use triage_models::HubPipeline;

/// Shared server state accessible from all handlers.
///
/// Built once at startup and never mutated.
pub struct ServerState {
    pub agents: Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let state = Arc::new(init_server_state(&config)?);
    let app = app::build_router(state, config.max_upload_bytes);

    info!("Starting server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the pipelines and guardrail from configuration.
fn init_server_state(config: &ServiceConfig) -> Result<ServerState> {
    for (role, model_id) in [
        ("text", &config.models.text),
        ("image", &config.models.image),
        ("voice", &config.models.voice),
    ] {
        info!("Loading {} model: {}", role, model_id);
    }

    let text = Arc::new(HubPipeline::new(&config.hub, &config.models.text));
    let image = Arc::new(HubPipeline::new(&config.hub, &config.models.image));
    let voice = Arc::new(HubPipeline::new(&config.hub, &config.models.voice));

    let rules = config
        .guardrail_rules()
        .context("failed to load guardrail rules")?;
    info!("Loaded {} guardrail rules", rules.len());
    for rule in rules.iter() {
        info!("  - {} -> {}", rule.keyword, rule.disease);
    }

    Ok(ServerState {
        agents: Agents::new(text, image, voice, &rules),
    })
}
