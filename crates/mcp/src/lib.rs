//! Model Context Protocol (MCP) prompt server for Cuecard.
//!
//! This crate exposes a [`cuecard_registry::PromptDispatcher`] as the MCP
//! prompts capability, hosts it over stdio or streamable HTTP, and loads the
//! server configuration.

pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig, TransportKind};
pub use server::{McpHttpServer, PromptServer, RunningMcpHttpServer, resolve_bind_address, serve_stdio};
