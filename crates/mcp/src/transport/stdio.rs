//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! One request per line in, one response per line out. Notifications and
//! blank lines produce no output. Logging stays on stderr so stdout carries
//! nothing but protocol frames.

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve MCP over stdio until stdin closes.
pub async fn run(service: Arc<McpService>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    info!("stdio transport ready");
    service.announce_started();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => service.handle_request(request).await,
            Err(e) => {
                debug!(error = %e, "unparseable frame");
                Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ))
            }
        };

        if let Some(response) = response {
            let mut frame = serde_json::to_vec(&response).context("serializing response")?;
            frame.push(b'\n');
            stdout.write_all(&frame).await.context("writing stdout")?;
            stdout.flush().await.context("flushing stdout")?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
