use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::proxy::ProxyError;

pub const DEFAULT_SOURCE: &str = "agentcore-runtime";

// Input: what the browser sends us
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub context: Value,
}

impl ChatRequest {
    /// An empty body reads as `{}`. Anything that is not an object with a
    /// non-empty string `message` is rejected.
    pub fn from_body(body: &[u8]) -> Result<Self, ProxyError> {
        let parsed: Value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|_| ProxyError::InvalidJson)?
        };

        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or(ProxyError::MissingMessage)?
            .to_string();

        let context = match parsed.get("context") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(context) => context.clone(),
        };

        Ok(Self { message, context })
    }
}

// Forwarded to the agent runtime
#[derive(Debug, Serialize)]
pub struct AgentPayload<'a> {
    pub message: &'a str,
    pub context: &'a Value,
}

// What the agent runtime hands back
#[derive(Debug, Deserialize)]
pub struct AgentResult {
    #[serde(default)]
    pub response: AgentReply,
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub source: Value,
}

/// The runtime's `response` field comes in several shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AgentReply {
    /// `"Hi there"`
    Text(String),
    /// `{"role": ..., "content": [{"text": ...}, ...]}`
    Content { content: Vec<Value> },
    /// `{"text": ...}`
    Field { text: String },
    Other(Value),
}

impl Default for AgentReply {
    fn default() -> Self {
        AgentReply::Other(Value::Null)
    }
}

impl AgentReply {
    pub fn into_text(self) -> String {
        match self {
            AgentReply::Text(text) | AgentReply::Field { text } => text,
            AgentReply::Content { content } => content
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" "),
            AgentReply::Other(Value::Null) => String::new(),
            AgentReply::Other(other) => {
                warn!("Unrecognised agent response shape; passing it through as JSON: {}", other);
                other.to_string()
            }
        }
    }
}

// Output: what we send back to the browser
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub assistant: String,
    pub timestamp: Value,
    pub source: Value,
    pub citations: Vec<Value>,
    pub pii_detected: bool,
}

impl From<AgentResult> for ChatResponse {
    fn from(result: AgentResult) -> Self {
        let source = match result.source {
            Value::Null => Value::String(DEFAULT_SOURCE.to_string()),
            source => source,
        };

        Self {
            assistant: result.response.into_text(),
            timestamp: result.timestamp,
            source,
            citations: Vec::new(),
            pii_detected: false,
        }
    }
}
