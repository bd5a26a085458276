//! Dependency injection: pick discovery strategies and loaders per mode

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use toolhub_application::{
    ClientOptions, CompositeDiscoveryStrategy, CompositeToolLoader, DirectToolLoader,
    DiscoveryStrategy, ProxyToolLoader, ServerMode, ServerOptions, SingleToolLoader, ToolLoader,
};
use toolhub_domain::CommandTree;
use toolhub_infrastructure::{CommandGroupDiscoveryStrategy, RegistryDiscoveryStrategy};
use tracing::info;

pub struct Settings {
    pub options: ServerOptions,
    pub client_options: ClientOptions,
    pub registry: Option<PathBuf>,
}

/// Build the tool loader serving `tree` (and the registry, when set).
pub fn build_loader(tree: Arc<CommandTree>, settings: &Settings) -> Result<Arc<dyn ToolLoader>> {
    let options = &settings.options;
    let registry = settings.registry.as_ref().map(|path| {
        Arc::new(RegistryDiscoveryStrategy::from_path(
            path,
            options.namespaces.clone(),
        )) as Arc<dyn DiscoveryStrategy>
    });

    let loader: Arc<dyn ToolLoader> = match options.mode {
        ServerMode::Direct => Arc::new(DirectToolLoader::new(tree, options.clone())),
        ServerMode::All => {
            let mut loaders: Vec<Arc<dyn ToolLoader>> =
                vec![Arc::new(DirectToolLoader::new(tree, options.clone()))];
            if let Some(registry) = registry {
                loaders.push(Arc::new(ProxyToolLoader::new(
                    registry,
                    settings.client_options.clone(),
                    options.read_only,
                )));
            }
            Arc::new(CompositeToolLoader::new(loaders))
        }
        ServerMode::Proxy => Arc::new(ProxyToolLoader::new(
            server_discovery(tree, options, registry)?,
            settings.client_options.clone(),
            options.read_only,
        )),
        ServerMode::Single => Arc::new(SingleToolLoader::new(
            server_discovery(tree, options, registry)?,
            settings.client_options.clone(),
            options.tool_name.clone(),
            options.read_only,
        )),
    };

    info!(
        mode = %options.mode,
        read_only = options.read_only,
        registry = settings.registry.is_some(),
        "Tool loader ready"
    );
    Ok(loader)
}

/// Command groups plus registry servers behind one strategy
fn server_discovery(
    tree: Arc<CommandTree>,
    options: &ServerOptions,
    registry: Option<Arc<dyn DiscoveryStrategy>>,
) -> Result<Arc<dyn DiscoveryStrategy>> {
    let mut strategies: Vec<Arc<dyn DiscoveryStrategy>> = vec![Arc::new(
        CommandGroupDiscoveryStrategy::new(tree, options.clone())?,
    )];
    strategies.extend(registry);
    Ok(Arc::new(CompositeDiscoveryStrategy::new(strategies)?))
}
