//! Intent resolution for the single gateway tool
//!
//! ```text
//!   intent only ──normalize──▶ learn
//!
//!   learn, no tool ─────────▶ Root-Learn  ──(sampling picks server)──┐
//!   learn, tool ────────────▶ Tool-Learn  ◀──────────────────────────┘
//!                                 │ (sampling picks command + parameters)
//!   tool + command ─────────▶ Command ◀┘
//!   anything else ──────────▶ Help
//! ```
//!
//! The state machine itself is pure; the loader in the application layer
//! performs discovery, sampling round-trips and the final call.

pub mod catalog;
pub mod request;
pub mod sampling;

pub use catalog::{HELP_TEXT, command_failure_message, format_command_catalog};
pub use request::{DEFAULT_GATEWAY_TOOL, IntentMode, IntentRequest, gateway_descriptor};
pub use sampling::{
    CommandChoice, SamplingRequest, UNKNOWN_ANSWER, command_selection_request,
    parse_command_choice, parse_server_choice, server_selection_request,
};
