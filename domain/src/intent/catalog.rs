//! Text returned by the gateway tool

use crate::tool::ToolDescriptor;

/// Returned when the arguments match no branch of the state machine
pub const HELP_TEXT: &str = "Nothing to do. Call again with `learn: true` to list the available \
servers, with `learn: true` and `tool` to list one server's commands, or with both `tool` and \
`command` (plus `parameters`) to run a command.";

/// Render one server's command catalog.
pub fn format_command_catalog(server: &str, tools: &[ToolDescriptor]) -> String {
    if tools.is_empty() {
        return format!("Server '{}' exposes no commands.", server);
    }

    let entries: Vec<serde_json::Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();

    format!(
        "Commands of '{}' (call again with `tool: \"{}\"`, `command` and `parameters`):\n{}",
        server,
        server,
        serde_json::to_string_pretty(&entries).unwrap_or_default()
    )
}

/// Diagnostic text for a failed gateway command.
pub fn command_failure_message(tool: &str, command: &str, error: &str) -> String {
    format!(
        "Command '{}' of tool '{}' failed: {}. Call again with `tool: \"{}\"` and `learn: true` \
         to check the command name and its parameters.",
        command, tool, error, tool
    )
}
