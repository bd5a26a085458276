//! Server domain module
//!
//! A server is an addressable source of tools: the local process scoped to
//! one command group, or a remote process/endpoint from the registry
//! document.

pub mod entities;
pub mod registry;

pub use entities::{ServerMetadata, duplicate_names, format_server_catalog};
pub use registry::{RegistryDocument, RegistryServerEntry, TransportConfig};
