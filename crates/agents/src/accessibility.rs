//! Accessibility agent - screen reader, contrast, captions and content checks.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Envelope, QueryContext,
    Result,
};

use crate::contains_any;

pub const ID: &str = "accessibility";

const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "accessibility",
    "screen reader",
    "high contrast",
    "large text",
    "voice navigation",
    "captions",
    "color blind",
    "disability",
    "visual aid",
];

const QUICK_ACCESS: &[&str] = &["screen_reader", "large_text", "high_contrast"];

const LONG_CONTENT_CHARS: usize = 500;
const COMPLEX_WORD_CHARS: usize = 12;
const MAX_COMPLEX_WORDS: usize = 5;

struct Feature {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    available_offline: bool,
}

const FEATURES: &[Feature] = &[
    Feature {
        key: "screen_reader",
        name: "Screen Reader Support",
        description: "Text-to-speech for all content",
        available_offline: true,
    },
    Feature {
        key: "high_contrast",
        name: "High Contrast Mode",
        description: "Enhanced visibility with high contrast themes",
        available_offline: true,
    },
    Feature {
        key: "large_text",
        name: "Large Text",
        description: "Increased font size for better readability",
        available_offline: true,
    },
    Feature {
        key: "captions",
        name: "Closed Captions",
        description: "Captions for audio/video content",
        available_offline: false,
    },
    Feature {
        key: "voice_navigation",
        name: "Voice Navigation",
        description: "Navigate app using voice commands",
        available_offline: true,
    },
    Feature {
        key: "color_blind_mode",
        name: "Color Blind Friendly",
        description: "Color schemes for color blindness",
        available_offline: true,
    },
];

fn feature_settings(key: &str) -> Value {
    match key {
        "screen_reader" => json!({
            "speech_rate": 1.0,
            "pitch": 1.0,
            "volume": 1.0,
            "auto_read": false,
        }),
        "high_contrast" => json!({ "theme": "dark", "contrast_level": "high" }),
        "large_text" => json!({ "font_scale": 1.5, "minimum_size": 18 }),
        "voice_navigation" => json!({
            "activation_phrase": "Hello App",
            "continuous_listening": false,
        }),
        "color_blind_mode" => json!({
            "mode": "deuteranopia",
            "options": ["protanopia", "deuteranopia", "tritanopia"],
        }),
        _ => json!({}),
    }
}

pub struct AccessibilityAgent {
    profile: AgentProfile,
}

impl AccessibilityAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Accessibility Agent")
                .with_description(
                    "Provides accessibility support including screen reader, captions, and visual aids",
                )
                .with_capabilities(vec![
                    AgentCapability::Accessibility,
                    AgentCapability::TextProcessing,
                    AgentCapability::VoiceProcessing,
                ])
                .with_priority(AgentPriority::Critical)
                .with_default_mode(AgentMode::Offline),
        }
    }
}

impl Default for AccessibilityAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn list_features() -> Envelope {
    let features: Map<String, Value> = FEATURES
        .iter()
        .map(|f| {
            (
                f.key.to_string(),
                json!({
                    "name": f.name,
                    "description": f.description,
                    "available_offline": f.available_offline,
                }),
            )
        })
        .collect();
    Envelope::message("Enable features based on your needs")
        .with("features", features)
        .with("quick_access", QUICK_ACCESS.to_vec())
}

fn enable_feature(requested: Option<&str>) -> Envelope {
    let Some(feature) = requested.and_then(|key| FEATURES.iter().find(|f| f.key == key)) else {
        let name = requested.unwrap_or("(none)");
        return Envelope::failure(format!("Feature {name} not found"))
            .with_error(format!("Feature {name} not found"))
            .with(
                "available_features",
                FEATURES.iter().map(|f| f.key).collect::<Vec<_>>(),
            );
    };

    Envelope::message(format!("{} enabled", feature.name))
        .with("feature", feature.key)
        .with("name", feature.name)
        .with("description", feature.description)
        .with("enabled", true)
        .with("settings", feature_settings(feature.key))
}

/// Strip markdown emphasis and give punctuation room to breathe.
pub fn screen_reader_text(content: &str) -> String {
    content
        .replace(['#', '*', '_'], "")
        .replace('.', ". ")
        .replace(',', ", ")
        .trim()
        .to_string()
}

pub fn content_recommendations(content: &str) -> Vec<&'static str> {
    let mut recommendations = Vec::new();
    if content.chars().count() > LONG_CONTENT_CHARS {
        recommendations.push("Consider breaking long content into smaller sections");
    }
    let has_letters = content.chars().any(char::is_alphabetic);
    if has_letters && content.chars().all(|c| !c.is_lowercase()) {
        recommendations.push("Avoid all caps text for better readability");
    }
    let complex = content
        .split_whitespace()
        .filter(|w| w.chars().count() > COMPLEX_WORD_CHARS)
        .count();
    if complex > MAX_COMPLEX_WORDS {
        recommendations.push("Consider simplifying complex words");
    }
    if recommendations.is_empty() {
        recommendations.push("Content is well-formatted for accessibility");
    }
    recommendations
}

fn format_content(content: &str, ctx: &QueryContext) -> Envelope {
    let enabled = ctx.get_str_list("enabled_features");
    let mut metadata = Map::new();

    if enabled.iter().any(|f| f == "screen_reader") {
        metadata.insert(
            "screen_reader_text".into(),
            Value::from(screen_reader_text(content)),
        );
    }
    if let Some(images) = ctx.get("images").and_then(Value::as_array) {
        let alt_texts = vec![Value::from("Educational diagram"); images.len()];
        metadata.insert("alt_texts".into(), Value::from(alt_texts));
    }
    metadata.insert(
        "structure".into(),
        json!({
            "has_headings": content.contains('#'),
            "has_lists": content.contains('-') || content.contains('*'),
            "word_count": content.split_whitespace().count(),
        }),
    );

    Envelope::message("Content formatted for accessibility")
        .with("original_content", content)
        .with("formatted_content", content)
        .with("accessibility_metadata", metadata)
        .with("recommendations", content_recommendations(content))
}

#[async_trait]
impl Agent for AccessibilityAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, ctx: &QueryContext) -> f32 {
        if ctx.flag("accessibility_mode") {
            return 1.0;
        }
        if contains_any(&query.to_lowercase(), ACCESSIBILITY_KEYWORDS) {
            0.95
        } else {
            0.0
        }
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        Ok(match ctx.operation_or("get_features") {
            "get_features" => list_features(),
            "enable_feature" => enable_feature(ctx.get_str("feature")),
            "format_content" => format_content(query, ctx),
            other => Envelope::failure(format!("Unknown operation: {other}"))
                .with_error(format!("Unknown operation: {other}")),
        })
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        self.process_offline(query, ctx).await
    }
}
