//! Stdio host for the prompt server.

use anyhow::{Result, anyhow};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::server::core::PromptServer;

/// Serve `server` over stdin/stdout until the client disconnects or
/// `shutdown` is cancelled.
///
/// Stdout carries protocol frames only; logging must go to stderr.
pub async fn serve_stdio(server: PromptServer, shutdown: CancellationToken) -> Result<()> {
    info!(prompts = server.dispatcher().registry().len(), "serving prompts over stdio");
    let running = server
        .serve_with_ct(stdio(), shutdown)
        .await
        .map_err(|error| anyhow!("MCP stdio initialization failed: {error}"))?;
    let reason = running
        .waiting()
        .await
        .map_err(|error| anyhow!("MCP stdio service task failed: {error}"))?;
    info!(reason = ?reason, "stdio session ended");
    Ok(())
}
