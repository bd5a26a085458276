//! Tool domain value objects: call requests, results and error payloads
//!
//! Every failure that reaches a caller is a [`CallToolResult`] with
//! `isError: true`, never a protocol-level error. [`ToolError`] carries the
//! category code so callers (usually an LLM) can tell what to fix:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `NOT_FOUND` | Unknown tool or server name |
//! | `INVALID_ARGUMENT` | Missing, null or mistyped parameters |
//! | `TRANSPORT` | The server process or endpoint could not be reached |
//! | `CONFIGURATION` | A registry entry is malformed |
//! | `EXECUTION_FAILED` | The downstream command itself failed |
//! | `PERMISSION_DENIED` | Blocked by read-only mode |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::CommandResponse;

/// A `tools/call` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

impl CallToolRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// One block of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
        }
    }
}

/// Result of a `tools/call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Successful single-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    /// Error single-text result
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }

    /// Wrap a command response as JSON text; non-2xx statuses become error results.
    pub fn from_command_response(response: &CommandResponse) -> Self {
        let text = serde_json::to_string(response).unwrap_or_else(|_| response.message.clone());
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: !response.is_success(),
        }
    }

    /// All text blocks joined by newlines
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ToolError> for CallToolResult {
    fn from(error: ToolError) -> Self {
        CallToolResult::error(error.to_string())
    }
}

/// Structured error payload rendered into an error [`CallToolResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "INVALID_ARGUMENT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Next step the caller can take
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Tool '{}' was not found", tool.into()))
            .with_hint("call tools/list to see the available tools")
    }

    pub fn server_not_found(server: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Server '{}' was not found", server.into()))
    }

    pub fn null_parameters(tool: impl Into<String>) -> Self {
        Self::new(
            "INVALID_ARGUMENT",
            format!("Cannot call tool '{}' with null parameters", tool.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new("TRANSPORT", message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new("CONFIGURATION", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn permission_denied(tool: impl Into<String>) -> Self {
        Self::new(
            "PERMISSION_DENIED",
            format!("Tool '{}' is not read-only and the server runs in read-only mode", tool.into()),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}
