//! Data models for the prompt server configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bind address for the streamable HTTP transport.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:62889";

/// Settings for serving the prompt catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport the `serve` command uses when none is given on the command line.
    #[serde(default)]
    pub transport: TransportKind,
    /// Streamable HTTP transport settings.
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Tracing filter directive used when `RUST_LOG` is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Instructions surfaced to clients during `initialize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Transport used to serve the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// Streamable HTTP mounted at `/mcp`.
    Http,
}

/// Configuration for the local streamable HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Socket address to bind. Must be a loopback address.
    pub bind_address: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::config::ValidationError),

    #[error("Configuration error: {message}")]
    Invalid { message: String },
}
