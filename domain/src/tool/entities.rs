//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::command::{Command, CommandMetadata, OptionSpec};

/// Capability hints advertised with a tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl From<&CommandMetadata> for ToolAnnotations {
    fn from(meta: &CommandMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            read_only_hint: Some(meta.read_only),
            destructive_hint: Some(meta.destructive),
            idempotent_hint: Some(meta.idempotent),
            open_world_hint: Some(meta.open_world),
        }
    }
}

/// A protocol-visible tool.
///
/// Remote servers may omit annotations entirely; a missing read-only hint is
/// treated as "not read-only".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema: empty_object_schema(),
            annotations: None,
        }
    }

    /// Build the descriptor of a command-tree leaf.
    pub fn from_command(full_name: &str, command: &dyn Command) -> Self {
        let metadata = command.metadata();
        Self {
            name: full_name.to_string(),
            title: metadata.title.clone(),
            description: command.description().to_string(),
            input_schema: input_schema(&command.options()),
            annotations: Some(ToolAnnotations::from(&metadata)),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.annotations
            .as_ref()
            .and_then(|a| a.read_only_hint)
            .unwrap_or(false)
    }
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Build a JSON schema object from a command's option list.
///
/// ```json
/// {
///   "type": "object",
///   "properties": { "account": { "type": "string", "description": "..." } },
///   "required": ["account"]
/// }
/// ```
pub fn input_schema(options: &[OptionSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for option in options {
        properties.insert(
            option.name.clone(),
            json!({
                "type": option.value_type.schema_type(),
                "description": option.description,
            }),
        );
        if option.required {
            required.push(Value::String(option.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    Value::Object(schema)
}
