//! Tool domain module
//!
//! Tools are what the protocol caller sees. A tool is either a command-tree
//! leaf converted in-process, or a descriptor republished from a remote
//! server.
//!
//! ```text
//! ┌──────────────┐    ┌─────────────────┐    ┌────────────────┐
//! │ Command      │───▶│ ToolDescriptor  │    │ CallToolResult │
//! │ + metadata   │    │ (tools/list)    │    │ (tools/call)   │
//! └──────────────┘    └─────────────────┘    └────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDescriptor`] / [`ToolAnnotations`]: name, schema and capability hints
//! - [`CallToolRequest`]: a call with optional arguments
//! - [`CallToolResult`] / [`ContentBlock`]: call output, `isError` for failures
//! - [`ToolError`]: categorized error text rendered into error results

pub mod entities;
pub mod value_objects;

pub use entities::{ToolAnnotations, ToolDescriptor, input_schema};
pub use value_objects::{CallToolRequest, CallToolResult, ContentBlock, ToolError};
