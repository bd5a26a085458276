//! Sampling prompts and answer parsing for intent resolution.
//!
//! Two questions are asked of the caller's model:
//!
//! 1. Which server best matches the intent? (a bare name, or `Unknown`)
//! 2. Which command of that server, with which parameters? (JSON)
//!
//! Answers are parsed defensively. Anything that does not name a known
//! server or command is treated as `Unknown`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::string::name_key;
use crate::server::ServerMetadata;
use crate::tool::ToolDescriptor;

/// Answer the model gives when nothing matches
pub const UNKNOWN_ANSWER: &str = "Unknown";

/// A single-turn question sent to the caller's model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Command picked by the model
#[derive(Debug, Clone, PartialEq)]
pub struct CommandChoice {
    pub command: String,
    pub parameters: Map<String, Value>,
}

pub fn server_selection_request(intent: &str, servers: &[ServerMetadata]) -> SamplingRequest {
    let mut catalog = String::new();
    for server in servers {
        catalog.push_str(&format!("- {}: {}\n", server.name, server.description));
    }

    SamplingRequest {
        system_prompt: format!(
            "You route requests to tool servers. Reply with exactly one server name \
             from the list, or {} if none fits. Do not add any other text.",
            UNKNOWN_ANSWER
        ),
        prompt: format!("Servers:\n{}\nRequest: {}", catalog, intent),
        max_tokens: 64,
    }
}

pub fn command_selection_request(
    intent: &str,
    server: &str,
    tools: &[ToolDescriptor],
    known_parameters: &Map<String, Value>,
) -> SamplingRequest {
    let catalog: Vec<Value> = tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();
    let catalog = serde_json::to_string_pretty(&catalog).unwrap_or_default();
    let known = serde_json::to_string(known_parameters).unwrap_or_else(|_| "{}".to_string());

    SamplingRequest {
        system_prompt: format!(
            "You pick one command of the '{}' server and fill in its parameters. \
             Reply with a JSON object {{\"command\": \"<name>\", \"parameters\": {{...}}}} \
             matching the command's inputSchema, or {} if none fits.",
            server, UNKNOWN_ANSWER
        ),
        prompt: format!(
            "Commands:\n{}\n\nAlready known parameters: {}\n\nRequest: {}",
            catalog, known, intent
        ),
        max_tokens: 1024,
    }
}

/// Parse the server picked by the model; returns the catalog's spelling.
pub fn parse_server_choice(answer: &str, servers: &[ServerMetadata]) -> Option<String> {
    let first_line = answer.lines().map(str::trim).find(|l| !l.is_empty())?;
    let candidate = first_line
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '.' || c == '*')
        .trim();

    if candidate.eq_ignore_ascii_case(UNKNOWN_ANSWER) {
        return None;
    }

    let key = name_key(candidate);
    servers
        .iter()
        .find(|s| name_key(&s.name) == key)
        .map(|s| s.name.clone())
}

/// Parse the command picked by the model.
///
/// Accepts a ` ```json ` fenced block, raw JSON, or JSON embedded in prose.
/// Known parameters fill in whatever the model left out.
pub fn parse_command_choice(
    answer: &str,
    tools: &[ToolDescriptor],
    known_parameters: &Map<String, Value>,
) -> Option<CommandChoice> {
    if answer.trim().eq_ignore_ascii_case(UNKNOWN_ANSWER) {
        return None;
    }

    let json = extract_json_object(answer)?;
    let requested = json.get("command")?.as_str()?;
    let key = name_key(requested);
    let tool = tools.iter().find(|t| name_key(&t.name) == key)?;

    let mut parameters = match json.get("parameters") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    for (name, value) in known_parameters {
        parameters.entry(name.clone()).or_insert_with(|| value.clone());
    }

    Some(CommandChoice {
        command: tool.name.clone(),
        parameters,
    })
}

fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    // ```json ... ``` or ``` ... ``` blocks
    let mut in_block = false;
    let mut block = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&block) {
                return Some(map);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(map);
    }

    // JSON embedded in prose
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
