//! Command domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Value type of a command option.
///
/// The mapping to JSON Schema is a fixed table, see [`ValueType::schema_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    /// JSON Schema `type` keyword for this value type.
    pub fn schema_type(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }

    /// Coerce a JSON value into this type.
    ///
    /// Scalars that arrive as strings (common when an LLM fills in
    /// parameters) are parsed; anything else must already match.
    pub fn coerce(&self, value: &serde_json::Value) -> Option<serde_json::Value> {
        use serde_json::Value;

        match (self, value) {
            (ValueType::String, Value::String(_)) => Some(value.clone()),
            (ValueType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ValueType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ValueType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(value.clone())
            }
            (ValueType::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::from)
            }
            (ValueType::Number, Value::Number(_)) => Some(value.clone()),
            (ValueType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            (ValueType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ValueType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (ValueType::Array, Value::Array(_)) => Some(value.clone()),
            (ValueType::Object, Value::Object(_)) => Some(value.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.schema_type())
    }
}

/// Declared option of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option name as it appears in tool arguments
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Whether the option must be supplied
    pub required: bool,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value_type: ValueType::String,
            required,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// Capability flags and display title of a command.
///
/// Tool annotations are built directly from this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Display title (falls back to the command name when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The command may delete or overwrite data
    pub destructive: bool,
    /// The command never mutates state
    pub read_only: bool,
    /// Repeating the call with the same arguments has no additional effect
    pub idempotent: bool,
    /// The command talks to systems outside the local process
    pub open_world: bool,
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self {
            title: None,
            destructive: true,
            read_only: false,
            idempotent: false,
            open_world: true,
        }
    }
}

impl CommandMetadata {
    /// Metadata for a non-mutating query command.
    pub fn read_only() -> Self {
        Self {
            title: None,
            destructive: false,
            read_only: true,
            idempotent: true,
            open_world: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_open_world(mut self, open_world: bool) -> Self {
        self.open_world = open_world;
        self
    }
}

/// Structured response of a command execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// HTTP-like status code (2xx = success)
    pub status: u16,
    /// Status message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

impl CommandResponse {
    /// Successful response carrying `results`
    pub fn ok(results: serde_json::Value) -> Self {
        Self {
            status: 200,
            message: "Success".to_string(),
            results: Some(results),
        }
    }

    /// Failed response with a status code and message
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            results: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Arguments bound onto a command's option set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: HashMap<String, serde_json::Value>,
}

impl BoundArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional i64 argument
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A problem found while binding arguments onto options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingIssue {
    MissingRequired(String),
    TypeMismatch { option: String, expected: ValueType },
}

impl std::fmt::Display for BindingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingIssue::MissingRequired(name) => write!(f, "missing required option '{}'", name),
            BindingIssue::TypeMismatch { option, expected } => {
                write!(f, "option '{}' must be of type {}", option, expected)
            }
        }
    }
}

/// Bind raw tool-call arguments onto an option set.
///
/// Unknown keys are dropped, `null` counts as absent, and scalar strings are
/// coerced to the declared type. All issues are reported at once so the
/// caller can fix every argument in one round-trip.
pub fn bind_arguments(
    options: &[OptionSpec],
    arguments: &serde_json::Map<String, serde_json::Value>,
) -> Result<BoundArguments, Vec<BindingIssue>> {
    let mut bound = BoundArguments::new();
    let mut issues = Vec::new();

    for option in options {
        match arguments.get(&option.name) {
            None | Some(serde_json::Value::Null) => {
                if option.required {
                    issues.push(BindingIssue::MissingRequired(option.name.clone()));
                }
            }
            Some(value) => match option.value_type.coerce(value) {
                Some(coerced) => {
                    bound.values.insert(option.name.clone(), coerced);
                }
                None => issues.push(BindingIssue::TypeMismatch {
                    option: option.name.clone(),
                    expected: option.value_type,
                }),
            },
        }
    }

    if issues.is_empty() {
        Ok(bound)
    } else {
        Err(issues)
    }
}

/// Per-invocation context handed to a command
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Cancelled when the caller abandons the request
    pub cancellation: CancellationToken,
}

impl CommandContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }
}
