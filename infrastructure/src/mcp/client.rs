//! Request helpers shared by the stdio and HTTP clients

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use toolhub_domain::{CallToolResult, ToolDescriptor};
use tracing::warn;

use super::error::Result;
use super::protocol::{CallToolParams, ListToolsParams, ListToolsResult, methods, parse_call_result};

/// Anything that can carry one request/response exchange
#[async_trait]
pub(crate) trait RequestChannel: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value>;
}

/// `tools/list`, following `nextCursor` until the last page
pub(crate) async fn list_all_tools(
    channel: &dyn RequestChannel,
    server: &str,
    cancel: &CancellationToken,
) -> Result<Vec<ToolDescriptor>> {
    let mut tools = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen = HashSet::new();

    loop {
        let params = serde_json::to_value(ListToolsParams {
            cursor: cursor.clone(),
        })?;
        let page: ListToolsResult =
            serde_json::from_value(channel.request(methods::TOOLS_LIST, Some(params), cancel).await?)?;
        tools.extend(page.tools);

        match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) if seen.insert(next.clone()) => cursor = Some(next),
            Some(next) => {
                warn!(server = %server, cursor = %next, "Server repeated a tools/list cursor, stopping");
                break;
            }
            None => break,
        }
    }

    Ok(tools)
}

pub(crate) async fn call_tool(
    channel: &dyn RequestChannel,
    name: &str,
    arguments: Option<Map<String, Value>>,
    cancel: &CancellationToken,
) -> Result<CallToolResult> {
    let params = serde_json::to_value(CallToolParams {
        name: name.to_string(),
        arguments,
        meta: None,
    })?;
    let value = channel.request(methods::TOOLS_CALL, Some(params), cancel).await?;
    parse_call_result(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned `tools/list` pages keyed by cursor
    struct Pages {
        pages: Vec<(Option<&'static str>, Value)>,
        requests: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl RequestChannel for Pages {
        async fn request(
            &self,
            _method: &str,
            params: Option<Value>,
            _cancel: &CancellationToken,
        ) -> Result<Value> {
            let params = params.unwrap_or_default();
            self.requests.lock().unwrap().push(params.clone());
            let cursor = params.get("cursor").and_then(Value::as_str);
            Ok(self
                .pages
                .iter()
                .find(|(c, _)| *c == cursor)
                .map(|(_, page)| page.clone())
                .unwrap_or_else(|| json!({"tools": []})))
        }
    }

    #[tokio::test]
    async fn test_follows_next_cursor() {
        let channel = Pages {
            pages: vec![
                (None, json!({"tools": [{"name": "a"}], "nextCursor": "p2"})),
                (Some("p2"), json!({"tools": [{"name": "b"}]})),
            ],
            requests: Mutex::new(Vec::new()),
        };
        let tools = list_all_tools(&channel, "docs", &CancellationToken::new())
            .await
            .unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(channel.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops() {
        let channel = Pages {
            pages: vec![
                (None, json!({"tools": [{"name": "a"}], "nextCursor": "loop"})),
                (Some("loop"), json!({"tools": [{"name": "b"}], "nextCursor": "loop"})),
            ],
            requests: Mutex::new(Vec::new()),
        };
        let tools = list_all_tools(&channel, "docs", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(tools.len(), 2);
    }
}
