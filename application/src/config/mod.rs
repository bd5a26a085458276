//! Application-level configuration.
//!
//! - [`ServerOptions`]: which loader serves requests, namespace scope and
//!   read-only mode, handed over by the CLI layer

pub mod server_options;

pub use server_options::{ServerMode, ServerOptions};
