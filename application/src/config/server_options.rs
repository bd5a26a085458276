//! Server options: the small struct the CLI hands to the core.

use serde::{Deserialize, Serialize};
use toolhub_domain::core::string::in_namespace;
use toolhub_domain::intent::DEFAULT_GATEWAY_TOOL;

/// Which tool loader serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    /// In-process command tree only
    Direct,
    /// Command tree plus registry servers, merged
    #[default]
    All,
    /// Every command group and registry server proxied
    Proxy,
    /// One gateway tool with learn → command navigation
    Single,
}

impl ServerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMode::Direct => "direct",
            ServerMode::All => "all",
            ServerMode::Proxy => "proxy",
            ServerMode::Single => "single",
        }
    }
}

impl std::fmt::Display for ServerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ServerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(ServerMode::Direct),
            "all" => Ok(ServerMode::All),
            "proxy" | "namespace" => Ok(ServerMode::Proxy),
            "single" => Ok(ServerMode::Single),
            other => Err(format!(
                "Invalid server mode: '{}'. Valid: direct, all, proxy, single",
                other
            )),
        }
    }
}

/// Options shaping discovery and the loaders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    pub mode: ServerMode,
    /// Namespace allow-list; `None` means every namespace
    pub namespaces: Option<Vec<String>>,
    /// Only expose (and allow calls to) read-only tools
    pub read_only: bool,
    /// Name of the gateway tool in single mode
    pub tool_name: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            mode: ServerMode::default(),
            namespaces: None,
            read_only: false,
            tool_name: DEFAULT_GATEWAY_TOOL.to_string(),
        }
    }
}

impl ServerOptions {
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Empty lists and blank entries count as "no filter"
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        let namespaces: Vec<String> = namespaces
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        self.namespaces = if namespaces.is_empty() {
            None
        } else {
            Some(namespaces)
        };
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    /// Whether a server or group name passes the namespace allow-list
    pub fn allows_namespace(&self, name: &str) -> bool {
        match &self.namespaces {
            Some(allowed) => allowed.iter().any(|ns| ns.eq_ignore_ascii_case(name.trim())),
            None => true,
        }
    }

    /// Whether a fully-qualified tool name falls under the allow-list
    pub fn allows_tool(&self, tool_name: &str) -> bool {
        match &self.namespaces {
            Some(allowed) => allowed.iter().any(|ns| in_namespace(tool_name, ns)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Direct".parse::<ServerMode>().unwrap(), ServerMode::Direct);
        assert_eq!("namespace".parse::<ServerMode>().unwrap(), ServerMode::Proxy);
        assert!("bogus".parse::<ServerMode>().is_err());
        assert_eq!(ServerMode::Single.to_string(), "single");
    }

    #[test]
    fn test_blank_namespaces_mean_no_filter() {
        let options = ServerOptions::default().with_namespaces(vec![" ".into()]);
        assert!(options.namespaces.is_none());
        assert!(options.allows_namespace("anything"));
    }

    #[test]
    fn test_namespace_filters() {
        let options = ServerOptions::default().with_namespaces(vec!["storage".into()]);
        assert!(options.allows_namespace("Storage"));
        assert!(!options.allows_namespace("keyvault"));
        assert!(options.allows_tool("storage-account-list"));
        assert!(!options.allows_tool("storagesync-list"));
    }
}
