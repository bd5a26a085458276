//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. Conversion into the
//! application's option types happens after [`FileConfig::validate`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toolhub_application::{ClientOptions, ServerMode, ServerOptions};

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("server.mode: {0}")]
    InvalidMode(String),

    #[error("timeouts.{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("server.tool_name cannot be empty")]
    EmptyToolName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// `[server]` section
    pub server: FileServerConfig,
    /// `[registry]` section
    pub registry: FileRegistryConfig,
    /// `[timeouts]` section
    pub timeouts: FileTimeoutsConfig,
}

/// Raw server configuration (`[server]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// direct, all, proxy or single
    pub mode: String,
    /// Namespace allow-list; empty means every namespace
    pub namespaces: Vec<String>,
    pub read_only: bool,
    /// Name of the gateway tool in single mode
    pub tool_name: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        let options = ServerOptions::default();
        Self {
            mode: options.mode.to_string(),
            namespaces: Vec::new(),
            read_only: options.read_only,
            tool_name: options.tool_name,
        }
    }
}

/// Raw registry configuration (`[registry]` section)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Registry document; no registry servers when unset
    pub path: Option<PathBuf>,
}

/// Raw timeout configuration (`[timeouts]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    /// Deadline for a child server's `initialize` handshake
    pub init_seconds: u64,
    /// Deadline for every later request to a child server
    pub call_seconds: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        let options = ClientOptions::default();
        Self {
            init_seconds: options.init_timeout.as_secs(),
            call_seconds: options.request_timeout.as_secs(),
        }
    }
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.server
            .mode
            .parse::<ServerMode>()
            .map_err(ConfigValidationError::InvalidMode)?;

        if self.server.tool_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyToolName);
        }
        if self.timeouts.init_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("init_seconds"));
        }
        if self.timeouts.call_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("call_seconds"));
        }
        Ok(())
    }

    /// Server options described by the `[server]` section
    pub fn server_options(&self) -> Result<ServerOptions, ConfigValidationError> {
        let mode = self
            .server
            .mode
            .parse::<ServerMode>()
            .map_err(ConfigValidationError::InvalidMode)?;
        Ok(ServerOptions::default()
            .with_mode(mode)
            .with_namespaces(self.server.namespaces.clone())
            .with_read_only(self.server.read_only)
            .with_tool_name(self.server.tool_name.trim()))
    }

    /// Client options described by the `[timeouts]` section
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_init_timeout(Duration::from_secs(self.timeouts.init_seconds))
            .with_request_timeout(Duration::from_secs(self.timeouts.call_seconds))
    }
}
