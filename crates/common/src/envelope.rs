//! The uniform response record returned by agents and the orchestrator.

use crate::AgentMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response envelope.
///
/// Identity, mode, timestamp and timing are stamped by the agent handle;
/// agents fill in the outcome and their payload under `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_internet: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AgentMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,

    /// Whole orchestrator call, as opposed to the primary agent's own time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_response_time_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_fallback: bool,

    /// Secondary-agent contributions keyed by what they add.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub enhancements: Map<String, Value>,

    #[serde(flatten)]
    pub data: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Envelope {
    /// Successful response carrying an answer.
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            success: true,
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    /// Successful response carrying a message (instructions, listings).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Unsuccessful response with a user-facing message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn requiring_internet(mut self) -> Self {
        self.requires_internet = true;
        self
    }

    /// Attach an agent-specific payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Add an enhancement unless one with the same key is already present.
    /// Returns whether it was inserted.
    pub fn add_enhancement(&mut self, key: &str, value: Value) -> bool {
        if self.enhancements.contains_key(key) {
            return false;
        }
        self.enhancements.insert(key.to_string(), value);
        true
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
