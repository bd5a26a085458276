//! Discovery building blocks shared by every strategy
//!
//! - [`OnceMap`] / [`ClientCache`]: create-once values keyed by server name
//! - [`CompositeDiscoveryStrategy`]: fan-out over several strategies
//!
//! Strategies that touch processes or files (command groups, the registry
//! document) live in the infrastructure layer.

pub mod client_cache;
pub mod composite;

pub use client_cache::{ClientCache, OnceMap, OnceSlot};
pub use composite::CompositeDiscoveryStrategy;
