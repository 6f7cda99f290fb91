use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::error::ToolError;
use crate::util::preview;

/// A named operation the agent runtime can call.
///
/// Implementations deserialize their own typed arguments from `input`, so a
/// missing required key surfaces as [`ToolError::InvalidInput`].
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the `input` object, published so the agent knows how
    /// to call the tool.
    fn parameters(&self) -> Value;

    async fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// Decodes a tool's argument struct. Arguments are passed by name, so
/// anything but a JSON object is rejected. Unknown keys are ignored.
pub fn parse_args<T: DeserializeOwned>(tool: &'static str, input: Value) -> Result<T, ToolError> {
    if !input.is_object() {
        let source = serde::de::Error::custom(format!(
            "expected an object of named arguments, got {}",
            input
        ));
        return Err(ToolError::InvalidInput { tool, source });
    }
    serde_json::from_value(input).map_err(|source| ToolError::InvalidInput { tool, source })
}

/// One dispatch request: `{ "toolName": ..., "toolInput": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
}

impl ToolInvocation {
    /// Lenient extraction from a raw event. A non-string or empty tool name
    /// counts as missing; an absent or null input becomes `{}`.
    pub fn from_event(event: &Value) -> Self {
        let tool_name = event
            .get("toolName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let tool_input = match event.get("toolInput") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(input) => input.clone(),
        };

        Self {
            tool_name,
            tool_input,
        }
    }
}

/// HTTP-analog response: a status code and a JSON-encoded body string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEnvelope {
    pub status_code: u16,
    pub body: String,
}

impl ToolEnvelope {
    pub fn new(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn ok(result: &Value) -> Self {
        Self::new(200, result)
    }

    pub fn from_error(err: &ToolError) -> Self {
        let message = match err {
            ToolError::MissingToolName | ToolError::UnknownTool(_) => err.to_string(),
            ToolError::InvalidInput { .. } | ToolError::Execution(_) => {
                format!("Tool execution failed: {}", err)
            }
        };
        Self::new(err.status_code(), &json!({ "error": message }))
    }

    /// Parses `body` back into JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Immutable name → tool table, built once at startup.
#[derive(Clone, Default)]
pub struct Registry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolves and runs one invocation. Never fails: every error becomes an
    /// envelope with the matching status.
    pub async fn dispatch(&self, event: &Value) -> ToolEnvelope {
        info!("Dispatch event: {}", preview(&event.to_string(), 500));
        let invocation = ToolInvocation::from_event(event);

        match self.invoke(invocation).await {
            Ok(result) => ToolEnvelope::ok(&result),
            Err(e) => {
                if e.status_code() >= 500 {
                    error!("Tool execution failed: {:?}", e);
                } else {
                    info!("Rejected tool call: {}", e);
                }
                ToolEnvelope::from_error(&e)
            }
        }
    }

    pub async fn invoke(&self, invocation: ToolInvocation) -> Result<Value, ToolError> {
        let name = invocation.tool_name.ok_or(ToolError::MissingToolName)?;
        let tool = self
            .get(&name)
            .ok_or_else(|| ToolError::UnknownTool(name.clone()))?;

        info!("Executing tool '{}'", name);
        tool.execute(invocation.tool_input).await
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl RegistryBuilder {
    /// Registers a tool under its own name; a later registration with the
    /// same name replaces the earlier one.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
        self
    }

    pub fn build(self) -> Registry {
        Registry { tools: self.tools }
    }
}
