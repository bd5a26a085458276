//! Discovery strategies that touch processes or files
//!
//! - [`CommandGroupDiscoveryStrategy`]: top-level command groups, each
//!   served by a re-executed child process
//! - [`RegistryDiscoveryStrategy`]: servers listed in a registry document
//!
//! Both hand out providers from [`providers`].

pub mod command_group;
pub mod providers;
pub mod registry;

pub use command_group::{CommandGroupDiscoveryStrategy, RESERVED_GROUPS};
pub use providers::{HttpServerProvider, MisconfiguredServerProvider, StdioServerProvider};
pub use registry::RegistryDiscoveryStrategy;
