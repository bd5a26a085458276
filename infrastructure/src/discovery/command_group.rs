//! Discovery of the local command tree's top-level groups.
//!
//! Each group becomes a server backed by a child process: this very
//! executable re-run as `serve --mode direct --namespace <group>`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolhub_application::{
    ClientCache, DiscoveryError, DiscoveryStrategy, ServerOptions, ServerProvider,
};
use toolhub_domain::core::string::name_key;
use toolhub_domain::{CommandTree, ServerMetadata};
use tracing::debug;

use super::providers::StdioServerProvider;
use crate::mcp::StdioLaunch;

/// Groups that never become child servers
pub const RESERVED_GROUPS: &[&str] = &["server", "tools", "extension"];

pub struct CommandGroupDiscoveryStrategy {
    tree: Arc<CommandTree>,
    options: ServerOptions,
    executable: PathBuf,
    cache: ClientCache,
}

impl CommandGroupDiscoveryStrategy {
    /// Children are spawned from the running executable.
    pub fn new(tree: Arc<CommandTree>, options: ServerOptions) -> Result<Self, DiscoveryError> {
        let executable = std::env::current_exe().map_err(|e| {
            DiscoveryError::Configuration(format!("Cannot locate the running executable: {}", e))
        })?;
        Ok(Self::with_executable(tree, options, executable))
    }

    pub fn with_executable(
        tree: Arc<CommandTree>,
        options: ServerOptions,
        executable: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tree,
            options,
            executable: executable.into(),
            cache: ClientCache::new(),
        }
    }

    fn launch(&self, group: &str) -> StdioLaunch {
        let mut args = vec![
            "serve".to_string(),
            "--mode".to_string(),
            "direct".to_string(),
            "--namespace".to_string(),
            group.to_string(),
        ];
        if self.options.read_only {
            args.push("--read-only".to_string());
        }
        StdioLaunch::new(self.executable.to_string_lossy(), args)
    }
}

fn is_reserved(group: &str) -> bool {
    let key = name_key(group);
    RESERVED_GROUPS.iter().any(|r| *r == key)
}

#[async_trait]
impl DiscoveryStrategy for CommandGroupDiscoveryStrategy {
    async fn discover(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn ServerProvider>>, DiscoveryError> {
        let providers: Vec<Arc<dyn ServerProvider>> = self
            .tree
            .groups()
            .iter()
            .filter(|g| !is_reserved(&g.name))
            .filter(|g| self.options.allows_namespace(&g.name))
            .map(|g| {
                let metadata = ServerMetadata::new(&g.name, &g.name, &g.description);
                Arc::new(StdioServerProvider::new(metadata, self.launch(&g.name)))
                    as Arc<dyn ServerProvider>
            })
            .collect();

        debug!(count = providers.len(), "Discovered command groups");
        Ok(providers)
    }

    fn client_cache(&self) -> &ClientCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use toolhub_application::ClientOptions;
    use toolhub_domain::{
        BoundArguments, Command, CommandContext, CommandError, CommandGroup, CommandMetadata,
        CommandResponse, OptionSpec,
    };

    struct Noop(&'static str);

    #[async_trait]
    impl Command for Noop {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "noop"
        }
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::read_only()
        }
        fn options(&self) -> Vec<OptionSpec> {
            Vec::new()
        }
        async fn execute(
            &self,
            _context: &CommandContext,
            _args: &BoundArguments,
        ) -> Result<CommandResponse, CommandError> {
            Ok(CommandResponse::ok(serde_json::Value::Null))
        }
    }

    fn tree() -> Arc<CommandTree> {
        let root = CommandGroup::new("root", "root")
            .with_group(CommandGroup::new("storage", "Storage accounts").with_command(Noop("list")))
            .with_group(CommandGroup::new("keyvault", "Key Vault").with_command(Noop("get")))
            .with_group(CommandGroup::new("tools", "Built-in").with_command(Noop("list")))
            .with_group(CommandGroup::new("Server", "Server control").with_command(Noop("start")));
        Arc::new(CommandTree::new(root).unwrap())
    }

    async fn names(strategy: &CommandGroupDiscoveryStrategy) -> Vec<String> {
        strategy
            .discover(&CancellationToken::new())
            .await
            .unwrap()
            .iter()
            .map(|p| p.metadata().name)
            .collect()
    }

    #[tokio::test]
    async fn test_reserved_groups_are_skipped() {
        let strategy =
            CommandGroupDiscoveryStrategy::with_executable(tree(), ServerOptions::default(), "/bin/toolhub");
        assert_eq!(names(&strategy).await, vec!["storage", "keyvault"]);
    }

    #[tokio::test]
    async fn test_namespace_allow_list() {
        let options = ServerOptions::default().with_namespaces(vec!["KeyVault".into()]);
        let strategy = CommandGroupDiscoveryStrategy::with_executable(tree(), options, "/bin/toolhub");
        assert_eq!(names(&strategy).await, vec!["keyvault"]);
    }

    #[test]
    fn test_launch_arguments() {
        let strategy = CommandGroupDiscoveryStrategy::with_executable(
            tree(),
            ServerOptions::default().with_read_only(true),
            "/bin/toolhub",
        );
        let launch = strategy.launch("storage");
        assert_eq!(launch.command, "/bin/toolhub");
        assert_eq!(
            launch.args,
            vec!["serve", "--mode", "direct", "--namespace", "storage", "--read-only"]
        );
        assert!(launch.env.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive() {
        let strategy =
            CommandGroupDiscoveryStrategy::with_executable(tree(), ServerOptions::default(), "/bin/toolhub");
        let cancel = CancellationToken::new();
        let found = strategy.find_by_name("STORAGE", &cancel).await.unwrap();
        assert_eq!(found.metadata().description, "Storage accounts");

        let err = strategy.find_by_name("tools", &cancel).await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_spawn_is_not_cached() {
        let strategy = CommandGroupDiscoveryStrategy::with_executable(
            tree(),
            ServerOptions::default(),
            "/nonexistent/toolhub",
        );
        let err = strategy
            .get_or_create_client("storage", &ClientOptions::default(), &CancellationToken::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DiscoveryError::Client { ref server, .. } if server == "storage"));
        assert!(strategy.client_cache().is_empty().await);
    }
}
