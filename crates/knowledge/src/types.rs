//! Stored record types and configuration for the local collaborators.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question/answer pair in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    /// Comma-separated keyword list.
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Builder input for [`KnowledgeEntry`]; the store assigns id, timestamps
/// and embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKnowledge {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_knowledge_category")]
    pub category: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub keywords: String,
}

impl NewKnowledge {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: default_knowledge_category(),
            language: default_language(),
            subject: None,
            grade_level: None,
            keywords: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
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

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppFaq {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub language: String,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyllabusContent {
    pub id: u64,
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    pub content: String,
    pub difficulty: String,
    pub language: String,
}

/// Snapshot returned by `InMemoryKnowledgeBase::stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_knowledge: usize,
    pub total_faqs: usize,
    pub total_syllabus: usize,
    pub by_category: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeUsage {
    pub count: usize,
    pub bytes: usize,
}

/// Snapshot returned by `InMemoryContentCache::stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_items: usize,
    pub total_bytes: usize,
    pub total_mb: f64,
    pub by_type: BTreeMap<String, TypeUsage>,
}

/// Snapshot returned by `InMemorySyllabusPlanner::stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerStats {
    pub total_topics: usize,
    pub total_paths: usize,
    /// "subject/grade" -> topic count.
    pub by_subject_grade: BTreeMap<String, usize>,
    pub active_users: usize,
}

/// Configuration for the local knowledge, cache and planner stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Only the leading words of a text feed the word buckets.
    #[serde(default = "default_max_embedded_words")]
    pub max_embedded_words: usize,

    /// Hits below this similarity are not treated as answers.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    #[serde(default = "default_max_cache_size_mb")]
    pub max_cache_size_mb: u64,
}

fn default_knowledge_category() -> String {
    "general".into()
}

pub(crate) fn default_language() -> String {
    "en".into()
}

fn default_embedding_dim() -> usize {
    100
}

fn default_max_embedded_words() -> usize {
    20
}

fn default_min_similarity() -> f32 {
    0.3
}

fn default_max_cache_size_mb() -> u64 {
    500
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            max_embedded_words: default_max_embedded_words(),
            min_similarity: default_min_similarity(),
            max_cache_size_mb: default_max_cache_size_mb(),
        }
    }
}
