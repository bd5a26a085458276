//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use toolhub_application::ServerMode;

/// CLI arguments for toolhub
#[derive(Parser, Debug)]
#[command(name = "toolhub")]
#[command(author, version, about = "MCP hub serving a command tree and remote tool servers")]
#[command(long_about = r#"
toolhub exposes commands and remote MCP servers to an MCP client over stdio.

Server modes:
  direct   Every command as its own tool, served in-process
  all      Commands in-process, plus every registry server's tools
  proxy    One tool per server; the caller learns then invokes commands
  single   One gateway tool routing natural-language intents

Configuration files are loaded from (in priority order):
1. TOOLHUB_* environment variables (TOOLHUB_SERVER__MODE=proxy)
2. --config <path>     Explicit config file
3. ./toolhub.toml      Project-level config
4. ~/.config/toolhub/config.toml   Global config

Example:
  toolhub serve --mode proxy --registry servers.json
  toolhub serve --mode direct --namespace storage --read-only
  toolhub tools list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long, global = true)]
    pub show_config: bool,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve MCP on stdin/stdout
    Serve(ServeArgs),

    /// Inspect the built-in command catalog
    Tools {
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Server mode (direct, all, proxy, single)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ServerMode>,

    /// Namespaces to expose (repeatable, comma-separated)
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    pub namespace: Vec<String>,

    /// Only expose read-only tools
    #[arg(long)]
    pub read_only: bool,

    /// Registry document listing remote servers
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Name of the gateway tool in single mode
    #[arg(long, value_name = "NAME")]
    pub tool_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ToolsCommand {
    /// Print the command catalog as JSON
    List {
        /// Only list commands of this top-level group
        #[arg(long, value_name = "NAME")]
        namespace: Option<String>,
    },
}
