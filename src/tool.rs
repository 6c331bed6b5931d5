use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MnemoError, Result};
use crate::tools::text::Sentiment;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// JSON schema for the tool's input, advertised to the language model.
    fn parameters(&self) -> Option<Value> {
        None
    }

    async fn call(&self, input: Value) -> Result<Value>;
}

/// The declaration forwarded to the language model for one registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Declarations in name order, so the model always sees a stable listing.
    pub fn describe(&self) -> Vec<ToolDescription> {
        let mut described: Vec<ToolDescription> = self
            .tools
            .values()
            .map(|tool| ToolDescription {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        described.sort_by(|a, b| a.name.cmp(&b.name));
        described
    }

    pub async fn call(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| MnemoError::ToolNotFound(name.to_string()))?;
        tool.call(input).await
    }
}

/// The result of one tool invocation. Transient, owned by the call site.
///
/// Failures surface as `Error` with a user-facing message, never as a raw
/// payload or an error raised past the tool boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    Numeric {
        value: f64,
    },
    DateString {
        date: String,
    },
    TextStats {
        word_count: usize,
        character_count: usize,
        sentiment: Sentiment,
    },
    WeatherSummary {
        city: String,
        temperature: f64,
        description: String,
        clothing: String,
    },
    Error {
        message: String,
    },
}

impl ToolOutput {
    /// Human-readable rendering, the form the assistant relays to the user.
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Numeric { value } => format!("Result: {}", format_number(*value)),
            ToolOutput::DateString { date } => date.clone(),
            ToolOutput::TextStats {
                word_count,
                character_count,
                sentiment,
            } => format!(
                "Words: {word_count}, characters: {character_count}, sentiment: {sentiment}"
            ),
            ToolOutput::WeatherSummary {
                city,
                temperature,
                description,
                clothing,
            } => format!(
                "{city}: {}°C, {description}. {clothing}",
                format_number(*temperature)
            ),
            ToolOutput::Error { message } => message.clone(),
        }
    }

    /// The JSON value handed back through the tool boundary: the tagged
    /// fields plus a `display` string.
    pub fn into_value(self) -> Value {
        let display = self.render();
        let mut value = serde_json::to_value(&self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("display".to_string(), Value::String(display));
        }
        value
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
