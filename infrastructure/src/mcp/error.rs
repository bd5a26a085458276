//! Error types for the MCP adapters

use thiserror::Error;
use toolhub_application::ClientError;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking MCP over a transport
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn server process: {0}")]
    SpawnError(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request '{0}' timed out")]
    Timeout(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        McpError::Http(e.to_string())
    }
}

impl From<McpError> for ClientError {
    fn from(e: McpError) -> Self {
        match e {
            McpError::RpcError { code, message } => ClientError::Remote { code, message },
            McpError::TransportClosed => ClientError::Closed,
            McpError::Timeout(method) => ClientError::Timeout(method),
            McpError::Cancelled => ClientError::Cancelled,
            McpError::SerializationError(e) => ClientError::Protocol(e.to_string()),
            McpError::UnexpectedResponse(msg) => ClientError::Protocol(msg),
            other @ (McpError::SpawnError(_) | McpError::Io(_) | McpError::Http(_)) => {
                ClientError::Transport(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let remote: ClientError = McpError::RpcError {
            code: -32602,
            message: "bad params".into(),
        }
        .into();
        assert_eq!(
            remote,
            ClientError::Remote {
                code: -32602,
                message: "bad params".into()
            }
        );

        let closed: ClientError = McpError::TransportClosed.into();
        assert_eq!(closed, ClientError::Closed);

        let spawn: ClientError =
            McpError::SpawnError(std::io::Error::other("no such file")).into();
        assert!(matches!(spawn, ClientError::Transport(msg) if msg.contains("no such file")));
    }
}
