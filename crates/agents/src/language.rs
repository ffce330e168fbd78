//! Language support agent - translation and localized UI labels.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Envelope, QueryContext,
    Result,
};
use vidya_llm::{LlmClient, LlmRequest};

use crate::contains_any;

pub const ID: &str = "language_support";

const TRANSLATION_KEYWORDS: &[&str] = &[
    "translate",
    "meaning in",
    "hindi me",
    "punjabi me",
    "क्या मतलब",
    "किसे कहते हैं",
    "ਕੀ ਹੈ",
];

const DEFAULT_SOURCE: &str = "en";
const DEFAULT_TARGET: &str = "hi";

const HINDI_UI: &[(&str, &str)] = &[
    ("home", "होम"),
    ("notes", "नोट्स"),
    ("timetable", "समय सारणी"),
    ("profile", "प्रोफ़ाइल"),
    ("settings", "सेटिंग्स"),
    ("help", "मदद"),
    ("scan", "स्कैन करें"),
    ("share", "शेयर करें"),
    ("save", "सहेजें"),
    ("cancel", "रद्द करें"),
];

const PUNJABI_UI: &[(&str, &str)] = &[
    ("home", "ਘਰ"),
    ("notes", "ਨੋਟਸ"),
    ("timetable", "ਸਮਾਂ ਸਾਰਣੀ"),
    ("profile", "ਪ੍ਰੋਫਾਈਲ"),
    ("settings", "ਸੈਟਿੰਗਜ਼"),
    ("help", "ਮਦਦ"),
    ("scan", "ਸਕੈਨ"),
    ("share", "ਸਾਂਝਾ"),
    ("save", "ਸੰਭਾਲੋ"),
    ("cancel", "ਰੱਦ"),
];

const UI_LANGUAGES: &[&str] = &["hi", "pa"];

fn ui_table(language: &str) -> Option<&'static [(&'static str, &'static str)]> {
    match language {
        "hi" => Some(HINDI_UI),
        "pa" => Some(PUNJABI_UI),
        _ => None,
    }
}

fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "hi" => "Hindi",
        "pa" => "Punjabi",
        other => other,
    }
}

pub struct LanguageSupportAgent {
    profile: AgentProfile,
    llm: Option<Arc<dyn LlmClient>>,
}

impl LanguageSupportAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Language Support Agent")
                .with_description(
                    "Provides translation and multi-language support for rural users",
                )
                .with_capabilities(vec![
                    AgentCapability::Translation,
                    AgentCapability::TextProcessing,
                ])
                .with_priority(AgentPriority::High)
                .with_default_mode(AgentMode::Auto),
            llm: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    async fn translate(
        &self,
        llm: &dyn LlmClient,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Envelope> {
        let prompt = format!(
            "Translate the following text from {} to {}. Reply with the translation only.\n\n{text}",
            language_name(source),
            language_name(target),
        );
        let response = llm
            .complete(LlmRequest::prompt(None, prompt).with_temperature(0.2))
            .await?;
        let translated = response.content.trim().to_string();

        Ok(Envelope::answer(translated.clone())
            .with("source_text", text)
            .with("source_language", source)
            .with("target_language", target)
            .with("translated_text", translated)
            .with("source", "ai_translation"))
    }
}

impl Default for LanguageSupportAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn languages(ctx: &QueryContext) -> (&str, &str) {
    (
        ctx.get_str("source_language").unwrap_or(DEFAULT_SOURCE),
        ctx.get_str("target_language").unwrap_or(DEFAULT_TARGET),
    )
}

fn translate_ui_element(text: &str, target: &str) -> Envelope {
    let key = text.trim().to_lowercase();
    let table = ui_table(target);
    if let Some((_, translated)) = table.and_then(|t| t.iter().find(|(k, _)| *k == key)) {
        return Envelope::answer(*translated)
            .with("original", text)
            .with("translated", *translated)
            .with("language", target);
    }

    let available: Vec<&str> = table
        .map(|t| t.iter().map(|(k, _)| *k).collect())
        .unwrap_or_default();
    Envelope::failure(format!("\"{text}\" is not in the offline dictionary"))
        .with_error(format!("UI element \"{text}\" not found in offline dictionary"))
        .with("available_elements", available)
}

fn ui_translations(language: &str) -> Envelope {
    let Some(table) = ui_table(language) else {
        return Envelope::failure(format!("No UI translations for {language}"))
            .with_error(format!("Language {language} not supported"))
            .with("supported", UI_LANGUAGES.to_vec());
    };
    let translations: Map<String, Value> = table
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect();
    Envelope::message(format!("UI translations for {}", language_name(language)))
        .with("language", language)
        .with("translations", translations)
}

#[async_trait]
impl Agent for LanguageSupportAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, ctx: &QueryContext) -> f32 {
        if ctx.flag("requires_translation") {
            return 1.0;
        }
        if contains_any(&query.to_lowercase(), TRANSLATION_KEYWORDS) {
            0.95
        } else {
            0.0
        }
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let (source, target) = languages(ctx);

        if ctx.operation_or("translate") == "ui_translations" {
            return Ok(ui_translations(target));
        }
        if ctx.flag("ui_element") {
            return Ok(translate_ui_element(query, target));
        }

        Ok(Envelope::failure("Full translation requires internet connection")
            .requiring_internet()
            .with_suggestion("Connect to internet for complete translation")
            .with("source_text", query)
            .with("source_language", source)
            .with("target_language", target)
            .with("available_offline", "Only UI elements can be translated offline"))
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        if ctx.operation_or("translate") == "ui_translations" || ctx.flag("ui_element") {
            return self.process_offline(query, ctx).await;
        }
        let Some(llm) = self.llm.as_deref() else {
            warn!(agent = ID, "No remote AI configured, translating offline");
            return self.process_offline(query, ctx).await;
        };

        let (source, target) = languages(ctx);
        match self.translate(llm, query, source, target).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!(agent = ID, error = %e, "Remote translation failed");
                Ok(self
                    .process_offline(query, ctx)
                    .await?
                    .with("note", "Online translation unavailable"))
            }
        }
    }
}
