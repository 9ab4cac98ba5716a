//! Local streamable HTTP host for the prompt server.

use std::net::SocketAddr;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{DEFAULT_BIND_ADDRESS, parse_loopback_address};
use crate::server::core::PromptServer;

/// Host configuration for a local streamable HTTP server instance.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    server: PromptServer,
}

impl McpHttpServer {
    /// Create a server that will serve `server` on `bind_address`.
    pub fn new(bind_address: SocketAddr, server: PromptServer) -> Self {
        Self { bind_address, server }
    }

    /// Start the server and return a handle for runtime inspection and shutdown.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let cancellation_token = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());
        let client_counter = Arc::new(AtomicUsize::new(0));
        let monitor_handle = spawn_session_monitor(
            Arc::clone(&session_manager),
            Arc::clone(&client_counter),
            cancellation_token.child_token(),
        );

        let prompt_server = self.server.clone();
        let service: StreamableHttpService<PromptServer, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(prompt_server.clone()),
            Arc::clone(&session_manager),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, prompts = self.server.dispatcher().registry().len(), "serving prompts over streamable HTTP at /mcp");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await
                    .inspect_err(|error| warn!(%error, "streamable HTTP server exited with an error"))
                    .context("streamable HTTP server failed")
            }
        });

        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
            monitor_handle,
            client_counter,
        })
    }
}

/// Runtime handle for a running streamable HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<Result<()>>,
    monitor_handle: JoinHandle<()>,
    client_counter: Arc<AtomicUsize>,
}

impl RunningMcpHttpServer {
    /// Return the bound socket address for the running server.
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Return the most recently observed client count.
    pub fn connected_clients(&self) -> usize {
        self.client_counter.load(Ordering::Relaxed)
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Stop the server and wait for background tasks to finish.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.wait().await
    }

    /// Wait until the server shuts down through its [`shutdown_token`](Self::shutdown_token).
    ///
    /// Returns the error the server exited with, if any.
    pub async fn wait(self) -> Result<()> {
        let served = self
            .server_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP server task failed: {error}"))?;
        self.cancellation_token.cancel();
        self.monitor_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP monitor task failed: {error}"))?;
        served?;
        info!(address = %self.bind_address, "streamable HTTP server stopped");
        Ok(())
    }
}

/// Resolve a safe local bind address for the streamable HTTP server.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr> {
    let address = bind_address.unwrap_or(DEFAULT_BIND_ADDRESS);
    parse_loopback_address(address).map_err(|error| anyhow!("invalid MCP HTTP bind address: {error}"))
}

fn spawn_session_monitor(
    session_manager: Arc<LocalSessionManager>,
    client_counter: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {
                    let count = session_manager.sessions.read().await.len();
                    client_counter.store(count, Ordering::Relaxed);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use cuecard_registry::{PromptDispatcher, PromptRegistryBuilder};

    use super::*;

    #[test]
    fn bind_address_defaults_to_loopback() {
        let address = resolve_bind_address(None).expect("default resolves");
        assert!(address.ip().is_loopback());
        assert_eq!(address.port(), 62889);
    }

    #[test]
    fn bind_address_must_be_loopback() {
        assert!(resolve_bind_address(Some("0.0.0.0:9000")).is_err());
        assert!(resolve_bind_address(Some("not an address")).is_err());
    }

    #[tokio::test]
    async fn server_starts_and_stops_on_an_ephemeral_port() {
        let server = PromptServer::new(PromptDispatcher::new(Arc::new(PromptRegistryBuilder::new().build())));
        let address = resolve_bind_address(Some("127.0.0.1:0")).expect("address resolves");

        let running = McpHttpServer::new(address, server).start().await.expect("server starts");

        assert_ne!(running.bound_address().port(), 0);
        assert_eq!(running.connected_clients(), 0);
        running.stop().await.expect("server stops");
    }

    #[tokio::test]
    async fn wait_reports_the_serve_error() {
        let cancellation_token = CancellationToken::new();
        let client_counter = Arc::new(AtomicUsize::new(0));
        let monitor = cancellation_token.child_token();
        let running = RunningMcpHttpServer {
            bind_address: resolve_bind_address(None).expect("default resolves"),
            cancellation_token,
            server_handle: tokio::spawn(async { Err(anyhow!("listener closed")) }),
            monitor_handle: tokio::spawn(async move { monitor.cancelled().await }),
            client_counter,
        };

        let error = running.wait().await.expect_err("serve error surfaces");

        assert!(error.to_string().contains("listener closed"));
    }
}
