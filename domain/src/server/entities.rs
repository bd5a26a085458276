//! Server domain entities

use serde::{Deserialize, Serialize};

/// Identity of one addressable sub-server.
///
/// `name` is the routing key used by callers and by the client cache;
/// comparisons on it are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ServerMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Render a list of servers as the human-readable root catalog.
pub fn format_server_catalog(servers: &[ServerMetadata]) -> String {
    if servers.is_empty() {
        return "No servers are available.".to_string();
    }

    let mut out = String::from("Available servers (pass one as `tool` with `learn: true` to see its commands):\n");
    for server in servers {
        out.push_str(&format!("- {}: {}\n", server.name, server.description));
    }
    out
}

/// Names that appear more than once (case-insensitive), in first-seen order.
pub fn duplicate_names(servers: &[ServerMetadata]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut dups = Vec::new();
    for server in servers {
        let key = crate::core::string::name_key(&server.name);
        if !seen.insert(key) && !dups.iter().any(|d: &String| d.eq_ignore_ascii_case(&server.name)) {
            dups.push(server.name.clone());
        }
    }
    dups
}
