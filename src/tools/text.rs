//! Text statistics and keyword sentiment tool.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{MnemoError, Result};
use crate::tool::{Tool, ToolOutput};

pub const POSITIVE_KEYWORDS: [&str; 4] = ["good", "great", "happy", "excellent"];
pub const NEGATIVE_KEYWORDS: [&str; 4] = ["bad", "sad", "poor", "terrible"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub character_count: usize,
    pub sentiment: Sentiment,
}

/// Word count, character count (Unicode scalar values, whitespace included)
/// and a keyword sentiment label.
///
/// Matching is case-insensitive substring presence: each keyword counts at
/// most once, and "saddle" counts as a "sad" hit.
pub fn analyze(text: &str) -> TextStats {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();
    let negative = NEGATIVE_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();

    let sentiment = if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    TextStats {
        word_count: text.split_whitespace().count(),
        character_count: text.chars().count(),
        sentiment,
    }
}

pub struct TextAnalyzerTool;

#[async_trait]
impl Tool for TextAnalyzerTool {
    fn name(&self) -> &str {
        "text_analyzer"
    }

    fn description(&self) -> &str {
        "Analyze text for word count, character count and sentiment. Expects {\"text\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Text to analyze"}
            },
            "required": ["text"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let text = input
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| MnemoError::InvalidInput("missing `text` for text_analyzer".into()))?;

        let stats = analyze(text);
        Ok(ToolOutput::TextStats {
            word_count: stats.word_count,
            character_count: stats.character_count,
            sentiment: stats.sentiment,
        }
        .into_value())
    }
}
