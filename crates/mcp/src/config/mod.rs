//! Configuration management for the prompt server.
//! This module handles loading and validation of the
//! ~/.config/cuecard/server.json configuration file.

mod io;
mod model;
mod validation;

pub use io::{CONFIG_PATH_ENV, default_config_path, expand_tilde, load_config, load_config_from_path};
pub use model::{ConfigError, DEFAULT_BIND_ADDRESS, HttpServerConfig, ServerConfig, TransportKind};
pub use validation::{ValidationError, parse_loopback_address, validate_config};
