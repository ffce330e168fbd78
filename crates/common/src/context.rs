//! Per-request query context.
//!
//! Common keys are typed; anything agent-specific lives in `extra`. Every
//! getter tolerates absence and returns a safe default.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// ISO 639-1 code of the user's language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Class or grade band, e.g. "10" or "8-10".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub grade_level: Option<String>,

    /// Connectivity signal supplied by the client. Absent means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_internet: Option<bool>,

    /// Sub-operation for multi-purpose agents (`tts`, `generate_quiz`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_internet(mut self, has_internet: bool) -> Self {
        self.has_internet = Some(has_internet);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_grade_level(mut self, grade_level: impl Into<String>) -> Self {
        self.grade_level = Some(grade_level.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Language code, defaulting to English.
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn operation_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.operation.as_deref().unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.extra.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Truthy check for flag-style keys. Missing or non-boolean is `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.extra.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.extra.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.extra.get(key)? {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.extra.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A list of strings; non-string elements are skipped.
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        self.extra
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_fall_back() {
        let ctx = QueryContext::default();
        assert_eq!(ctx.language(), "en");
        assert_eq!(ctx.operation_or("tts"), "tts");
        assert!(!ctx.flag("voice_input"));
        assert!(ctx.get_str("feature").is_none());
        assert!(ctx.get_u64("count").is_none());
        assert!(ctx.get_str_list("enabled_features").is_empty());
    }

    #[test]
    fn deserializes_typed_and_extension_keys() {
        let ctx: QueryContext = serde_json::from_value(json!({
            "language": "hi",
            "subject": "Science",
            "grade_level": 10,
            "has_internet": false,
            "operation": "generate_quiz",
            "count": "2",
            "voice_input": true,
            "enabled_features": ["screen_reader", 7]
        }))
        .unwrap();

        assert_eq!(ctx.language(), "hi");
        assert_eq!(ctx.subject.as_deref(), Some("Science"));
        assert_eq!(ctx.grade_level.as_deref(), Some("10"));
        assert_eq!(ctx.has_internet, Some(false));
        assert_eq!(ctx.get_u64("count"), Some(2));
        assert!(ctx.flag("voice_input"));
        assert_eq!(ctx.get_str_list("enabled_features"), vec!["screen_reader"]);
        assert!(!ctx.extra.contains_key("language"));
    }

    #[test]
    fn builder_sets_fields() {
        let ctx = QueryContext::new()
            .with_internet(true)
            .with_subject("Mathematics")
            .with_extra("difficulty", "hard");
        assert_eq!(ctx.has_internet, Some(true));
        assert_eq!(ctx.subject.as_deref(), Some("Mathematics"));
        assert_eq!(ctx.get_str("difficulty"), Some("hard"));
        assert!(ctx.has("difficulty"));
    }

    #[test]
    fn non_boolean_flag_is_false() {
        let ctx = QueryContext::new().with_extra("accessibility_mode", "yes");
        assert!(!ctx.flag("accessibility_mode"));
    }
}
