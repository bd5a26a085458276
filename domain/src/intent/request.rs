//! Gateway tool arguments and the learn → command state machine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::tool::{ToolAnnotations, ToolDescriptor};

/// Default name of the single gateway tool
pub const DEFAULT_GATEWAY_TOOL: &str = "gateway";

/// Arguments of one gateway call.
///
/// Recomputed from the caller's arguments on every call; nothing is kept
/// between calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub learn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "lenient_parameters")]
    pub parameters: Map<String, Value>,
}

/// Which branch of the state machine a request takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentMode {
    /// List the top-level servers
    RootLearn,
    /// List the commands of one server
    ToolLearn { tool: String },
    /// Invoke a command on a server
    Command { tool: String, command: String },
    /// Nothing usable was supplied
    Help,
}

impl IntentRequest {
    /// Parse and normalize gateway arguments.
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let request: IntentRequest = serde_json::from_value(Value::Object(arguments.clone()))?;
        Ok(request.normalize())
    }

    /// Trim fields, drop empty strings, and turn a bare intent into a learn
    /// request. An intent alone never triggers a blind call.
    pub fn normalize(mut self) -> Self {
        self.intent = non_empty(self.intent);
        self.tool = non_empty(self.tool);
        self.command = non_empty(self.command);

        if self.intent.is_some() && self.tool.is_none() && self.command.is_none() && !self.learn {
            self.learn = true;
        }
        self
    }

    pub fn mode(&self) -> IntentMode {
        match (self.learn, &self.tool, &self.command) {
            (true, None, _) => IntentMode::RootLearn,
            (true, Some(tool), _) => IntentMode::ToolLearn { tool: tool.clone() },
            (false, Some(tool), Some(command)) => IntentMode::Command {
                tool: tool.clone(),
                command: command.clone(),
            },
            _ => IntentMode::Help,
        }
    }

    /// Non-empty intent text, if any
    pub fn intent_text(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    /// Switch to learning the commands of `tool`
    pub fn learning_tool(mut self, tool: impl Into<String>) -> Self {
        self.learn = true;
        self.tool = Some(tool.into());
        self.command = None;
        self
    }

    /// Switch to invoking `command` with `parameters`
    pub fn invoking(mut self, command: impl Into<String>, parameters: Map<String, Value>) -> Self {
        self.learn = false;
        self.command = Some(command.into());
        self.parameters = parameters;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

// LLM callers sometimes send the parameters object JSON-encoded as a string.
fn lenient_parameters<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            match serde_json::from_str::<Value>(&s) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(serde::de::Error::custom(
                    "parameters must be a JSON object",
                )),
            }
        }
        Some(Value::Null) | Some(Value::String(_)) | None => Ok(Map::new()),
        Some(_) => Err(serde::de::Error::custom("parameters must be a JSON object")),
    }
}

/// Descriptor of the gateway tool.
pub fn gateway_descriptor(name: &str, read_only: bool) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        "Discover and run tools. Call with `learn: true` to list servers, with \
         `tool` and `learn: true` to list that server's commands, then with `tool`, \
         `command` and `parameters` to run a command. `intent` describes what you \
         want in plain language.",
    )
    .with_schema(json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "description": "What you want to do, in plain language"
            },
            "learn": {
                "type": "boolean",
                "description": "List servers, or the commands of `tool`"
            },
            "tool": {
                "type": "string",
                "description": "Server to use"
            },
            "command": {
                "type": "string",
                "description": "Command of `tool` to run"
            },
            "parameters": {
                "type": "object",
                "description": "Arguments of `command`"
            }
        }
    }))
    .with_annotations(ToolAnnotations {
        title: Some("Tool gateway".to_string()),
        read_only_hint: Some(read_only),
        destructive_hint: Some(!read_only),
        idempotent_hint: Some(false),
        open_world_hint: Some(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: Value) -> IntentRequest {
        IntentRequest::from_arguments(value.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_intent_alone_forces_learn() {
        let req = parse(json!({"intent": "list my storage accounts"}));
        assert!(req.learn);
        assert_eq!(req.mode(), IntentMode::RootLearn);
    }

    #[test]
    fn test_intent_with_tool_does_not_force_learn() {
        let req = parse(json!({"intent": "x", "tool": "storage"}));
        assert!(!req.learn);
        assert_eq!(req.mode(), IntentMode::Help);
    }

    #[test]
    fn test_modes() {
        assert_eq!(parse(json!({"learn": true})).mode(), IntentMode::RootLearn);
        assert_eq!(
            parse(json!({"learn": true, "tool": "storage"})).mode(),
            IntentMode::ToolLearn {
                tool: "storage".into()
            }
        );
        assert_eq!(
            parse(json!({"tool": "storage", "command": "account-list"})).mode(),
            IntentMode::Command {
                tool: "storage".into(),
                command: "account-list".into()
            }
        );
        assert_eq!(parse(json!({})).mode(), IntentMode::Help);
        assert_eq!(parse(json!({"command": "account-list"})).mode(), IntentMode::Help);
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let req = parse(json!({"intent": "  ", "tool": "", "learn": "TRUE"}));
        assert!(req.intent.is_none());
        assert!(req.tool.is_none());
        assert!(req.learn);
    }

    #[test]
    fn test_parameters_as_encoded_string() {
        let req = parse(json!({
            "tool": "storage",
            "command": "account-list",
            "parameters": "{\"subscription\": \"sub1\"}"
        }));
        assert_eq!(req.parameters["subscription"], "sub1");
    }

    #[test]
    fn test_parameters_must_be_object() {
        let args = json!({"parameters": [1, 2]});
        assert!(IntentRequest::from_arguments(args.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_transitions() {
        let req = parse(json!({"intent": "x"}))
            .learning_tool("storage")
            .invoking("account-list", Map::new());
        assert_eq!(
            req.mode(),
            IntentMode::Command {
                tool: "storage".into(),
                command: "account-list".into()
            }
        );
        assert_eq!(req.intent_text(), Some("x"));
    }

    #[test]
    fn test_gateway_descriptor_read_only_hint() {
        assert!(gateway_descriptor(DEFAULT_GATEWAY_TOOL, true).is_read_only());
        assert!(!gateway_descriptor(DEFAULT_GATEWAY_TOOL, false).is_read_only());
    }
}
