//! MCP client over a child process's stdin/stdout.
//!
//! The child is owned by the client: it is spawned with `kill_on_drop`, and
//! on Linux additionally asks the kernel to signal it when this process
//! dies, so no server outlives the hub.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use toolhub_application::{ClientError, ClientOptions, McpClient};
use toolhub_domain::{CallToolResult, ToolDescriptor};
use tracing::{debug, info, trace};

use super::client::{self, RequestChannel};
use super::error::{McpError, Result};
use super::protocol::{
    Implementation, InitializeParams, InitializeResult, JsonRpcResponseOut, error_codes, methods,
};
use super::router::{Incoming, MessageRouter};

/// How to start a stdio server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioLaunch {
    pub command: String,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment
    pub env: HashMap<String, String>,
}

impl StdioLaunch {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

pub struct StdioMcpClient {
    server: String,
    router: Arc<MessageRouter>,
    request_timeout: Duration,
    server_info: Implementation,
    /// Child process (killed on Drop to prevent orphans)
    child: Option<Child>,
}

impl StdioMcpClient {
    /// Spawn the server process and complete the `initialize` handshake.
    pub async fn spawn(
        server: &str,
        launch: &StdioLaunch,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        debug!(server = %server, command = %launch.command, args = ?launch.args, "Spawning stdio server");

        let mut cmd = Command::new(&launch.command);
        cmd.args(&launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .envs(&launch.env)
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(McpError::SpawnError)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdin"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(server.to_string(), stderr));
        }

        let mut client = Self::connect(server, stdout, stdin, options, cancel).await;
        if let Ok(client) = &mut client {
            client.child = Some(child);
        }
        client
    }

    /// Run the client over an already connected stream pair.
    pub async fn connect<R, W>(
        server: &str,
        reader: R,
        writer: W,
        options: &ClientOptions,
        cancel: &CancellationToken,
    ) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (router, incoming) = MessageRouter::start(server, reader, writer);
        tokio::spawn(answer_incoming(
            server.to_string(),
            Arc::downgrade(&router),
            incoming,
        ));

        let mut client = Self {
            server: server.to_string(),
            router,
            request_timeout: options.request_timeout,
            server_info: Implementation::default(),
            child: None,
        };
        client.initialize(options, cancel).await?;
        Ok(client)
    }

    async fn initialize(&mut self, options: &ClientOptions, cancel: &CancellationToken) -> Result<()> {
        let params = InitializeParams::new(Implementation::new(
            &options.client_name,
            &options.client_version,
        ));
        let value = self
            .router
            .request(
                methods::INITIALIZE,
                Some(serde_json::to_value(params)?),
                options.init_timeout,
                cancel,
            )
            .await?;
        let result: InitializeResult = serde_json::from_value(value)?;

        info!(
            server = %self.server,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "Connected to stdio server"
        );
        self.router.notify(methods::INITIALIZED, None).await?;
        self.server_info = result.server_info;
        Ok(())
    }

    /// Name and version the server reported
    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }
}

impl Drop for StdioMcpClient {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

#[async_trait]
impl RequestChannel for StdioMcpClient {
    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.router
            .request(method, params, self.request_timeout, cancel)
            .await
    }
}

#[async_trait]
impl McpClient for StdioMcpClient {
    async fn list_tools(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ToolDescriptor>, ClientError> {
        Ok(client::list_all_tools(self, &self.server, cancel).await?)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> std::result::Result<CallToolResult, ClientError> {
        Ok(client::call_tool(self, name, arguments, cancel).await?)
    }
}

/// Forward the child's stderr to the log, line by line
async fn forward_stderr(server: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(server = %server, "stderr: {}", line);
    }
}

/// Answer server-initiated traffic. Only `ping` is served.
async fn answer_incoming(
    server: String,
    router: Weak<MessageRouter>,
    mut incoming: mpsc::UnboundedReceiver<Incoming>,
) {
    while let Some(message) = incoming.recv().await {
        match message {
            Incoming::Request(request) => {
                let Some(router) = router.upgrade() else {
                    break;
                };
                let response = if request.method == methods::PING {
                    JsonRpcResponseOut::success(request.id, json!({}))
                } else {
                    debug!(server = %server, method = %request.method, "Rejecting server request");
                    JsonRpcResponseOut::failure(
                        request.id,
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method '{}' is not supported by this client", request.method),
                    )
                };
                if let Err(e) = router.respond(&response).await {
                    debug!(server = %server, error = %e, "Failed to answer server request");
                }
            }
            Incoming::Notification(notification) => {
                trace!(server = %server, method = %notification.method, "Server notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_missing_executable() {
        let launch = StdioLaunch::new("/nonexistent/toolhub-test-server", vec![]);
        let err = StdioMcpClient::spawn(
            "missing",
            &launch,
            &ClientOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, McpError::SpawnError(_)));
        assert!(matches!(ClientError::from(err), ClientError::Transport(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_server_times_out_during_initialize() {
        let launch = StdioLaunch::new("sleep", vec!["5".to_string()]);
        let options = ClientOptions::default().with_init_timeout(Duration::from_millis(100));
        let err = StdioMcpClient::spawn("silent", &launch, &options, &CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Timeout(ref m) if m == "initialize"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exiting_server_closes_transport() {
        let launch = StdioLaunch::new("true", vec![]);
        let err = StdioMcpClient::spawn(
            "gone",
            &launch,
            &ClientOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, McpError::TransportClosed | McpError::Io(_)));
    }

    #[test]
    fn test_launch_env() {
        let launch = StdioLaunch::new("git-mcp", vec!["--stdio".into()])
            .with_env(HashMap::from([("A".to_string(), "2".to_string())]));
        assert_eq!(launch.env.get("A").map(String::as_str), Some("2"));
        assert!(StdioLaunch::new("git-mcp", vec![]).env.is_empty());
    }

    /// Answers `initialize` with `$HOME|$B|<PATH inherited?>` as the server
    /// name and its pid as the version, then idles until stdin closes.
    #[cfg(target_os = "linux")]
    const ECHO_ENV_SERVER: &str = r#"read line
id=$(printf '%s' "$line" | sed 's/.*"id":\([0-9]*\).*/\1/')
printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2025-06-18","capabilities":{},"serverInfo":{"name":"%s|%s|%s","version":"%s"}}}\n' "$id" "$HOME" "$B" "${PATH:+inherited}" "$$"
while read line; do :; done"#;

    #[cfg(target_os = "linux")]
    fn echo_env_launch() -> StdioLaunch {
        StdioLaunch::new("sh", vec!["-c".to_string(), ECHO_ENV_SERVER.to_string()]).with_env(
            HashMap::from([
                ("HOME".to_string(), "/entry".to_string()),
                ("B".to_string(), "3".to_string()),
            ]),
        )
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_child_inherits_environment_with_entry_overrides() {
        let client = StdioMcpClient::spawn(
            "env",
            &echo_env_launch(),
            &ClientOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(client.server_info().name, "/entry|3|inherited");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_child_killed_when_client_dropped() {
        let client = StdioMcpClient::spawn(
            "owned",
            &echo_env_launch(),
            &ClientOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        let pid: u32 = client.server_info().version.parse().unwrap();
        let stat = format!("/proc/{}/stat", pid);
        assert!(std::path::Path::new(&stat).exists());

        drop(client);

        let mut gone = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            // A killed but unreaped child lingers as a zombie (state `Z`).
            gone = match std::fs::read_to_string(&stat) {
                Err(_) => true,
                Ok(s) => s
                    .rsplit(')')
                    .next()
                    .is_some_and(|rest| rest.trim_start().starts_with('Z')),
            };
            if gone {
                break;
            }
        }
        assert!(gone, "server process {} still running", pid);
    }
}
