mod prompts;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use cuecard_mcp::config::{load_config, load_config_from_path};
use cuecard_mcp::{McpHttpServer, PromptServer, ServerConfig, TransportKind, resolve_bind_address, serve_stdio};
use cuecard_registry::PromptDispatcher;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => load_config_from_path(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => load_config().context("failed to load server configuration")?,
    };
    init_tracing(config.log_filter.as_deref());

    let registry = prompts::build_registry().context("failed to register bundled prompts")?;
    let dispatcher = PromptDispatcher::new(Arc::new(registry));

    match matches.subcommand() {
        Some(("serve", sub)) => serve(dispatcher, &config, sub).await,
        Some(("list", _)) => list(&dispatcher),
        Some(("get", sub)) => get(&dispatcher, sub).await,
        _ => Err(anyhow!("expected a subcommand; run with --help for usage")),
    }
}

fn build_cli() -> Command {
    Command::new("cuecard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serve a catalog of prompts over the Model Context Protocol")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to $CUECARD_CONFIG_PATH or the user config dir)"),
        )
        .subcommand(
            Command::new("serve").about("Serve the prompt catalog").arg(
                Arg::new("http")
                    .long("http")
                    .value_name("ADDR")
                    .num_args(0..=1)
                    .help("Serve streamable HTTP at /mcp instead of stdio, optionally on ADDR"),
            ),
        )
        .subcommand(Command::new("list").about("Print the prompt catalog as JSON"))
        .subcommand(
            Command::new("get")
                .about("Render a prompt locally and print the result as JSON")
                .arg(Arg::new("name").required(true).help("Prompt name"))
                .arg(
                    Arg::new("arg")
                        .long("arg")
                        .short('a')
                        .value_name("KEY=VALUE")
                        .action(ArgAction::Append)
                        .help("Prompt argument; may be repeated"),
                ),
        )
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: Option<&str>) {
    let directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| "info".into());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn serve(dispatcher: PromptDispatcher, config: &ServerConfig, matches: &ArgMatches) -> Result<()> {
    let mut server = PromptServer::new(dispatcher);
    if let Some(instructions) = &config.instructions {
        server = server.with_instructions(instructions.clone());
    }

    let transport = if matches.contains_id("http") {
        TransportKind::Http
    } else {
        config.transport
    };
    let shutdown = CancellationToken::new();
    spawn_ctrl_c_listener(shutdown.clone());

    match transport {
        TransportKind::Stdio => serve_stdio(server, shutdown).await,
        TransportKind::Http => {
            let address = matches
                .get_one::<String>("http")
                .map(String::as_str)
                .unwrap_or(config.http.bind_address.as_str());
            let running = McpHttpServer::new(resolve_bind_address(Some(address))?, server).start().await?;
            info!(address = %running.bound_address(), "press Ctrl+C to stop");
            shutdown.cancelled().await;
            running.stop().await
        }
    }
}

fn spawn_ctrl_c_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        shutdown.cancel();
    });
}

fn list(dispatcher: &PromptDispatcher) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&dispatcher.list())?);
    Ok(())
}

async fn get(dispatcher: &PromptDispatcher, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("name").context("missing prompt name")?;
    let arguments = parse_arguments(matches.get_many::<String>("arg").into_iter().flatten())?;

    let result = dispatcher.invoke(name, Some(&arguments), CancellationToken::new()).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Parse repeated `key=value` pairs. Values stay text; the binder coerces them.
fn parse_arguments<'a>(pairs: impl IntoIterator<Item = &'a String>) -> Result<Map<String, Value>> {
    let mut arguments = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("argument '{pair}' must be in KEY=VALUE form"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("argument '{pair}' has an empty key"));
        }
        arguments.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(arguments)
}
