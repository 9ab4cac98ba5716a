//! Configuration validation for the prompt server.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;

/// Validate the entire server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), ValidationError> {
    parse_loopback_address(&config.http.bind_address)?;
    validate_optional_text("logFilter", config.log_filter.as_deref())?;
    validate_optional_text("instructions", config.instructions.as_deref())?;
    debug!(transport = ?config.transport, bind_address = %config.http.bind_address, "validated server configuration");
    Ok(())
}

/// Parse `address` and require it to be a loopback socket address.
pub fn parse_loopback_address(address: &str) -> Result<SocketAddr, ValidationError> {
    let parsed: SocketAddr = address.trim().parse().map_err(|error: std::net::AddrParseError| ValidationError::InvalidBindAddress {
        address: address.to_string(),
        reason: error.to_string(),
    })?;
    if !is_loopback(parsed.ip()) {
        return Err(ValidationError::NonLoopbackBindAddress {
            address: address.to_string(),
        });
    }
    Ok(parsed)
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn validate_optional_text(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.trim().is_empty() => Err(ValidationError::EmptyField { field: field.to_string() }),
        _ => Ok(()),
    }
}

/// Validation errors for server configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("Bind address '{address}' is not a loopback address")]
    NonLoopbackBindAddress { address: String },

    #[error("Field '{field}' must not be empty when present")]
    EmptyField { field: String },
}
