//! Offline knowledge agent - app help and cached answers, no network.
//!
//! This is the designated fallback agent: it answers app-usage questions
//! from the FAQ store and educational questions from cached Q&A or syllabus
//! content, and says plainly when a question needs connectivity.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Envelope, KnowledgeLookup,
    QueryContext, Result, SyllabusItem,
};

use crate::contains_any;

pub const ID: &str = "offline_knowledge";

const APP_KEYWORDS: &[&str] = &[
    "how to use",
    "help",
    "guide",
    "app",
    "feature",
    "navigation",
    "settings",
    "scan",
    "share",
    "qr",
    "timetable",
    "notes",
    "offline",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "what is",
    "explain",
    "definition",
    "formula",
    "theorem",
    "law",
    "principle",
    "concept",
];

pub const AVAILABLE_SUBJECTS: &[&str] =
    &["Science", "Mathematics", "Social Science", "English", "Hindi"];

const OFFLINE_FEATURES: &[&str] = &[
    "App usage help and FAQs",
    "How to use app features",
    "Navigation guidance",
    "Settings and preferences",
];

const APP_HELP_SUGGESTIONS: &[&str] = &[
    "How do I use this app?",
    "Can I use this app offline?",
    "How do I scan notes?",
];

const DEFAULT_MIN_SIMILARITY: f32 = 0.3;

/// Localized "connect to the internet" notice. Unknown languages get English.
pub fn internet_required_message(language: &str) -> &'static str {
    match language {
        "hi" => "🌐 शैक्षिक प्रश्नों के लिए इंटरनेट कनेक्शन आवश्यक है। ऑफ़लाइन मोड में मैं केवल ऐप उपयोग प्रश्नों में मदद कर सकता हूं।",
        "pa" => "🌐 ਵਿਦਿਅਕ ਸਵਾਲਾਂ ਲਈ ਇੰਟਰਨੈੱਟ ਕਨੈਕਸ਼ਨ ਲੋੜੀਂਦਾ ਹੈ। ਔਫਲਾਈਨ ਮੋਡ ਵਿੱਚ ਮੈਂ ਸਿਰਫ਼ ਐਪ ਵਰਤੋਂ ਸਵਾਲਾਂ ਵਿੱਚ ਮਦਦ ਕਰ ਸਕਦਾ ਹਾਂ।",
        "bn" => "🌐 শিক্ষামূলক প্রশ্নের জন্য ইন্টারনেট সংযোগ প্রয়োজন। অফলাইন মোডে আমি শুধুমাত্র অ্যাপ ব্যবহারের প্রশ্নে সাহায্য করতে পারি।",
        "ta" => "🌐 கல்வி கேள்விகளுக்கு இணைய இணைப்பு தேவை. ஆஃப்லைன் பயன்முறையில் நான் ஆப் பயன்பாட்டு கேள்விகளில் மட்டுமே உதவ முடியும்.",
        "te" => "🌐 విద్యా ప్రశ్నలకు ఇంటర్నెట్ కనెక్షన్ అవసరం. ఆఫ్‌లైన్ మోడ్‌లో నేను యాప్ వినియోగ ప్రశ్నలలో మాత్రమే సహాయం చేయగలను।",
        "mr" => "🌐 शैक्षणिक प्रश्नांसाठी इंटरनेट कनेक्शन आवश्यक आहे. ऑफलाइन मोडमध्ये मी फक्त अॅप वापर प्रश्नांमध्ये मदत करू शकतो।",
        "gu" => "🌐 શૈક્ષણિક પ્રશ્નો માટે ઇન્ટરનેટ કનેક્શન જરૂરી છે. ઓફલાઇન મોડમાં હું ફક્ત એપ્લિકેશન ઉપયોગ પ્રશ્નોમાં મદદ કરી શકું છું।",
        _ => "🌐 Internet connection required for educational questions. I can only help with app usage questions in offline mode.",
    }
}

pub struct OfflineKnowledgeAgent {
    profile: AgentProfile,
    knowledge: Option<Arc<dyn KnowledgeLookup>>,
    min_similarity: f32,
}

impl OfflineKnowledgeAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Offline Knowledge Agent")
                .with_description(
                    "Provides instant responses from cached knowledge base. Works completely offline.",
                )
                .with_capabilities(vec![
                    AgentCapability::TextProcessing,
                    AgentCapability::ContentGeneration,
                ])
                .with_priority(AgentPriority::Critical)
                .with_default_mode(AgentMode::Offline),
            knowledge: None,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeLookup>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    async fn answer_app_query(
        &self,
        kb: &dyn KnowledgeLookup,
        query: &str,
        language: &str,
    ) -> Result<Envelope> {
        let faqs = kb.search_app_faqs(query, 3, Some(language)).await?;
        let Some(top) = faqs.first() else {
            return Ok(Envelope::failure(
                "No matching app help found. Try rephrasing your question.",
            )
            .with("suggestions", APP_HELP_SUGGESTIONS.to_vec()));
        };

        let alternatives: Vec<_> = faqs
            .iter()
            .skip(1)
            .take(2)
            .map(|faq| json!({ "question": faq.question, "answer": faq.answer }))
            .collect();

        Ok(Envelope::answer(&top.answer)
            .with("question", top.question.as_str())
            .with("category", top.category.as_str())
            .with("source", "offline_faq")
            .with("confidence", 0.95)
            .with("alternative_results", alternatives))
    }

    async fn answer_educational_query(
        &self,
        kb: &dyn KnowledgeLookup,
        query: &str,
        ctx: &QueryContext,
    ) -> Result<Envelope> {
        let language = ctx.language();
        let hits = kb
            .search(query, 3, Some(language), ctx.subject.as_deref())
            .await?;

        if let Some(top) = hits.first().filter(|h| h.similarity >= self.min_similarity) {
            debug!(similarity = top.similarity, "Answering from cached knowledge");
            let alternatives: Vec<_> = hits
                .iter()
                .skip(1)
                .take(2)
                .map(|h| {
                    json!({ "question": h.question, "answer": h.answer, "confidence": h.similarity })
                })
                .collect();
            return Ok(Envelope::answer(&top.answer)
                .with("question", top.question.as_str())
                .with("subject", top.subject.as_deref().unwrap_or("General"))
                .with("grade_level", top.grade_level.as_deref().unwrap_or("All"))
                .with("source", "offline_knowledge")
                .with("confidence", top.similarity)
                .with("alternative_results", alternatives));
        }

        let syllabus = kb
            .get_syllabus_content(
                ctx.subject.as_deref(),
                ctx.grade_level.as_deref(),
                Some(language),
            )
            .await?;
        if let Some(envelope) = best_syllabus_match(query, &syllabus) {
            return Ok(envelope);
        }

        Ok(Envelope::failure(internet_required_message(language))
            .requiring_internet()
            .with_suggestion("Please connect to internet to get answers to educational questions.")
            .with("query_type", "educational")
            .with("offline_features", OFFLINE_FEATURES.to_vec())
            .with("available_subjects", AVAILABLE_SUBJECTS.to_vec()))
    }
}

impl Default for OfflineKnowledgeAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Words of four or more letters; shorter ones are mostly function words.
fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_string)
        .collect()
}

/// Rank syllabus items by shared words with the query.
fn best_syllabus_match(query: &str, items: &[SyllabusItem]) -> Option<Envelope> {
    let query_words = content_words(query);

    let mut matched: Vec<(usize, &SyllabusItem)> = items
        .iter()
        .filter_map(|item| {
            let mut item_words = content_words(&item.topic);
            item_words.extend(content_words(&item.content));
            let score = query_words.intersection(&item_words).count();
            (score > 0).then_some((score, item))
        })
        .collect();
    // stable: equal scores keep syllabus order
    matched.sort_by(|a, b| b.0.cmp(&a.0));

    let (score, best) = *matched.first()?;
    let related: Vec<&str> = matched
        .iter()
        .skip(1)
        .take(3)
        .map(|(_, item)| item.topic.as_str())
        .collect();

    Some(
        Envelope::answer(&best.content)
            .with("topic", best.topic.as_str())
            .with("subject", best.subject.as_str())
            .with("grade_level", best.grade_level.as_str())
            .with("difficulty", best.difficulty.as_str())
            .with("source", "syllabus_content")
            .with("confidence", (score as f64 / 3.0).min(1.0))
            .with("related_topics", related),
    )
}

#[async_trait]
impl Agent for OfflineKnowledgeAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, _ctx: &QueryContext) -> f32 {
        let lowered = query.to_lowercase();
        if contains_any(&lowered, APP_KEYWORDS) {
            0.9
        } else if contains_any(&lowered, EDUCATION_KEYWORDS) {
            0.7
        } else {
            0.3
        }
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let Some(kb) = self.knowledge.as_deref() else {
            return Ok(Envelope::failure(
                "Offline knowledge agent requires knowledge base access",
            )
            .with_error("Knowledge base not initialized"));
        };

        if contains_any(&query.to_lowercase(), APP_KEYWORDS) {
            self.answer_app_query(kb, query, ctx.language()).await
        } else {
            self.answer_educational_query(kb, query, ctx).await
        }
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        // Local answers are faster than any remote call.
        self.process_offline(query, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(topic: &str, content: &str) -> SyllabusItem {
        SyllabusItem {
            topic: topic.into(),
            content: content.into(),
            subject: "Science".into(),
            grade_level: "10".into(),
            difficulty: "intermediate".into(),
        }
    }

    #[test]
    fn scores() {
        let agent = OfflineKnowledgeAgent::new();
        let ctx = QueryContext::default();
        assert_eq!(agent.can_handle("How do I use this app?", &ctx), 0.9);
        assert_eq!(agent.can_handle("Explain gravity", &ctx), 0.7);
        assert_eq!(agent.can_handle("xyzzy", &ctx), 0.3);
    }

    #[test]
    fn internet_message_defaults_to_english() {
        assert!(internet_required_message("fr").starts_with("🌐 Internet connection required"));
        assert_ne!(internet_required_message("hi"), internet_required_message("en"));
    }

    #[test]
    fn syllabus_overlap_picks_best_topic() {
        let items = vec![
            item("Light Reflection", "mirrors bend light"),
            item("Life Processes", "nutrition respiration transport in plants"),
        ];
        let envelope = best_syllabus_match("respiration in plants", &items).unwrap();
        assert_eq!(envelope.get_str("topic"), Some("Life Processes"));
        assert_eq!(envelope.get_str("source"), Some("syllabus_content"));
        assert!(best_syllabus_match("quantum chromodynamics", &items).is_none());
    }

    #[tokio::test]
    async fn missing_knowledge_base_is_a_failure() {
        let agent = OfflineKnowledgeAgent::new();
        let resp = agent
            .process_offline("help", &QueryContext::default())
            .await
            .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Knowledge base not initialized"));
    }
}
