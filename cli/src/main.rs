//! CLI entrypoint for toolhub
//!
//! This is the main binary that wires together all layers using
//! dependency injection. Stdout is reserved for the MCP channel, so all
//! logging goes to stderr (and optionally a log file).

mod cli;
mod wiring;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolhub_application::ToolRuntime;
use toolhub_infrastructure::commands::summarize;
use toolhub_infrastructure::{ConfigLoader, FileConfig, McpServer, build_command_tree};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use cli::{Cli, Command, ServeArgs, ToolsCommand};
use wiring::{Settings, build_loader};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the entire program lifetime
    let _log_guard = init_tracing(cli.verbose, cli.log_dir.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config
        .validate()
        .context("Configuration validation failed")?;

    match cli.command {
        Command::Serve(args) => serve(&config, args).await,
        Command::Tools {
            command: ToolsCommand::List { namespace },
        } => list_commands(namespace.as_deref()),
    }
}

/// Initialize logging based on verbosity level.
///
/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "toolhub.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

/// Apply `serve` flags on top of the loaded configuration.
fn settings(config: &FileConfig, args: ServeArgs) -> Result<Settings> {
    let mut options = config.server_options()?;
    if let Some(mode) = args.mode {
        options = options.with_mode(mode);
    }
    if !args.namespace.is_empty() {
        options = options.with_namespaces(args.namespace);
    }
    if args.read_only {
        options = options.with_read_only(true);
    }
    if let Some(tool_name) = args.tool_name {
        options = options.with_tool_name(tool_name);
    }

    Ok(Settings {
        options,
        client_options: config.client_options(),
        registry: args.registry.or_else(|| config.registry.path.clone()),
    })
}

async fn serve(config: &FileConfig, args: ServeArgs) -> Result<()> {
    let settings = settings(config, args)?;
    info!(mode = %settings.options.mode, "Starting toolhub");

    // === Dependency Injection ===
    let tree = build_command_tree(Vec::new())?;
    let loader = build_loader(tree, &settings)?;
    let runtime = Arc::new(ToolRuntime::new(loader, settings.options.read_only));

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, shutting down"),
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
        on_signal.cancel();
    });

    McpServer::new(runtime).serve_stdio(shutdown).await?;
    info!("toolhub stopped");
    Ok(())
}

fn list_commands(namespace: Option<&str>) -> Result<()> {
    let tree = build_command_tree(Vec::new())?;
    let commands = summarize(&tree, namespace);
    println!("{}", serde_json::to_string_pretty(&commands)?);
    Ok(())
}
