//! Configuration file loading for toolhub
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Command-line flags (applied by the binary)
//! 2. `TOOLHUB_*` environment variables, `__` separating sections
//! 3. `--config <path>` specified file
//! 4. Project root: `./toolhub.toml` or `./.toolhub.toml`
//! 5. Global: `$XDG_CONFIG_HOME/toolhub/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileRegistryConfig, FileServerConfig, FileTimeoutsConfig,
};
pub use loader::ConfigLoader;
