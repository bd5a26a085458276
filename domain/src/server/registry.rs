//! Registry document: static description of remote servers
//!
//! ```json
//! {
//!   "servers": {
//!     "docs": { "description": "Docs search", "url": "https://example.com/mcp" },
//!     "git":  { "description": "Git tools", "type": "stdio",
//!               "command": "git-mcp", "args": ["--stdio"], "env": {"GIT_DIR": "."} }
//!   }
//! }
//! ```
//!
//! Entries are validated lazily: a malformed entry only fails when a client
//! is created for it, so one bad entry never hides its siblings.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::entities::ServerMetadata;
use crate::core::error::DomainError;
use crate::core::string::name_key;

/// The parsed registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub servers: BTreeMap<String, RegistryServerEntry>,
}

/// One server entry of the registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryServerEntry {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// How to reach a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Spawn a child process and speak over its stdin/stdout
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    /// Connect to a network endpoint
    Http { url: String },
}

impl RegistryDocument {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Entries whose id is in the namespace allow-list (all when `None`)
    pub fn entries<'a>(
        &'a self,
        namespaces: Option<&'a [String]>,
    ) -> impl Iterator<Item = (&'a String, &'a RegistryServerEntry)> + 'a {
        self.servers.iter().filter(move |(id, _)| match namespaces {
            Some(allowed) => allowed.iter().any(|ns| name_key(ns) == name_key(id)),
            None => true,
        })
    }

    /// Case-insensitive lookup by id
    pub fn get(&self, id: &str) -> Option<(&String, &RegistryServerEntry)> {
        let key = name_key(id);
        self.servers.iter().find(|(k, _)| name_key(k) == key)
    }
}

impl RegistryServerEntry {
    pub fn metadata(&self, id: &str) -> ServerMetadata {
        ServerMetadata::new(id, id, self.description.clone())
    }

    /// Resolve the transport of this entry.
    ///
    /// Exactly one of `type == "stdio"` with a command, or a url, must be set.
    pub fn transport(&self, id: &str) -> Result<TransportConfig, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidRegistryEntry {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let is_stdio = self
            .transport_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("stdio"));
        let command = self.command.as_deref().filter(|c| !c.trim().is_empty());
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty());

        match (is_stdio, command, url) {
            (true, Some(command), None) => Ok(TransportConfig::Stdio {
                command: command.to_string(),
                args: self.args.clone(),
                env: self.env.clone(),
            }),
            (false, None, Some(url)) => Ok(TransportConfig::Http {
                url: url.to_string(),
            }),
            (_, Some(_), Some(_)) => Err(invalid("both command and url are set")),
            (true, None, _) => Err(invalid("type is 'stdio' but no command is set")),
            (false, Some(_), None) => Err(invalid("command is set but type is not 'stdio'")),
            (false, None, None) => Err(invalid("neither a stdio command nor a url is set")),
        }
    }
}
