use anyhow::{Context, Result};
use cdsync_client::{ClientConfig, SyncClient};
use cdsync_core::{Settings, TransportMode};
use cdsync_mcp::McpService;
use std::sync::Arc;

mod api;
mod stream;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; in stdio mode stdout carries only protocol
    // frames.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdsync=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env().context("loading settings from environment")?;

    tracing::info!("Starting CData Sync MCP adapter");
    tracing::info!("Sync API at {}", settings.base_url);

    let mut config = ClientConfig::new(settings.base_url.clone());
    config.auth = Some(settings.auth.clone());
    config.timeout = settings.request_timeout;

    let client = SyncClient::from_config(config, settings.default_workspace.clone())
        .context("building Sync API client")?;
    let service = Arc::new(McpService::new(client));

    match settings.transport {
        TransportMode::Stdio => cdsync_mcp::transport::stdio::run(service).await,
        TransportMode::Http => {
            api::serve(&settings.bind_addr(), service, settings.pending_timeout).await
        }
    }
}
