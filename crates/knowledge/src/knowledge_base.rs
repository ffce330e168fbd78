//! In-memory offline knowledge base: Q&A, app FAQs and syllabus content.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vidya_common::{FaqEntry, KnowledgeHit, KnowledgeLookup, Result, SyllabusItem};

use crate::embedding::{cosine_similarity, HashEmbedder};
use crate::types::{
    default_language, AppFaq, KnowledgeConfig, KnowledgeEntry, KnowledgeStats, NewKnowledge,
    SyllabusContent,
};

const QUESTION_HIT: f32 = 2.0;
const KEYWORD_HIT: f32 = 1.5;
const ANSWER_HIT: f32 = 0.5;
const EXACT_QUESTION_BONUS: f32 = 3.0;

/// Words too common to say anything about which FAQ was meant.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "can", "do", "does", "for", "how", "i", "in", "is", "it", "me",
    "my", "of", "on", "the", "this", "to", "what", "why", "with", "you",
];

#[derive(Default)]
struct Tables {
    knowledge: Vec<KnowledgeEntry>,
    faqs: Vec<AppFaq>,
    syllabus: Vec<SyllabusContent>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct InMemoryKnowledgeBase {
    config: KnowledgeConfig,
    embedder: HashEmbedder,
    tables: RwLock<Tables>,
}

impl InMemoryKnowledgeBase {
    pub fn new(config: KnowledgeConfig) -> Self {
        info!(
            embedding_dim = config.embedding_dim,
            min_similarity = config.min_similarity,
            "Initializing offline knowledge base"
        );
        Self {
            embedder: HashEmbedder::from_config(&config),
            config,
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(KnowledgeConfig::default())
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// Add a Q&A pair. The embedding covers the question and its keywords.
    pub async fn add_knowledge(&self, entry: NewKnowledge) -> u64 {
        let embedding = self
            .embedder
            .embed(&format!("{} {}", entry.question, entry.keywords));
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        debug!(id, category = %entry.category, "Adding knowledge entry");
        tables.knowledge.push(KnowledgeEntry {
            id,
            question: entry.question,
            answer: entry.answer,
            category: entry.category,
            language: entry.language,
            subject: entry.subject,
            grade_level: entry.grade_level,
            keywords: entry.keywords,
            usage_count: 0,
            last_accessed: None,
            created_at: Utc::now(),
            embedding,
        });
        id
    }

    pub async fn add_app_faq(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<String>,
        keywords: impl Into<String>,
    ) -> u64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.faqs.push(AppFaq {
            id,
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
            language: default_language(),
            keywords: keywords.into(),
        });
        id
    }

    pub async fn add_syllabus_content(
        &self,
        subject: impl Into<String>,
        grade_level: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> u64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.syllabus.push(SyllabusContent {
            id,
            subject: subject.into(),
            grade_level: grade_level.into(),
            topic: topic.into(),
            subtopic: None,
            content: content.into(),
            difficulty: difficulty.into(),
            language: default_language(),
        });
        id
    }

    /// Usage count of a Q&A entry, if it exists.
    pub async fn usage_count(&self, id: u64) -> Option<u64> {
        let tables = self.tables.read().await;
        tables
            .knowledge
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.usage_count)
    }

    pub async fn stats(&self) -> KnowledgeStats {
        let tables = self.tables.read().await;
        let mut stats = KnowledgeStats {
            total_knowledge: tables.knowledge.len(),
            total_faqs: tables.faqs.len(),
            total_syllabus: tables.syllabus.len(),
            ..Default::default()
        };
        for entry in &tables.knowledge {
            *stats.by_category.entry(entry.category.clone()).or_default() += 1;
        }
        stats
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::with_default_config()
    }
}

/// Keep items in the requested language; when none match, keep everything so
/// a Hindi-speaking student still gets the English content.
fn language_filtered<'a, T>(
    items: &'a [T],
    language: Option<&str>,
    lang_of: impl Fn(&T) -> &str,
) -> Vec<&'a T> {
    if let Some(lang) = language {
        let matching: Vec<&T> = items.iter().filter(|i| lang_of(i) == lang).collect();
        if !matching.is_empty() {
            return matching;
        }
    }
    items.iter().collect()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn normalized(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn faq_score(query_tokens: &HashSet<String>, query_norm: &str, faq: &AppFaq) -> f32 {
    let question = tokens(&faq.question);
    let keywords = tokens(&faq.keywords);
    let answer = tokens(&faq.answer);

    if query_tokens.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    for token in query_tokens {
        if question.contains(token) {
            score += QUESTION_HIT;
        }
        if keywords.contains(token) {
            score += KEYWORD_HIT;
        }
        if answer.contains(token) {
            score += ANSWER_HIT;
        }
    }

    let question_norm = normalized(&faq.question);
    if question_norm.contains(query_norm) || query_norm.contains(&question_norm)
    {
        score += EXACT_QUESTION_BONUS;
    }
    score
}

#[async_trait]
impl KnowledgeLookup for InMemoryKnowledgeBase {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Vec<KnowledgeHit>> {
        let query_embedding = self.embedder.embed(query);

        let mut tables = self.tables.write().await;
        let candidates = language_filtered(&tables.knowledge, language, |e| e.language.as_str());

        let mut scored: Vec<(u64, f32, KnowledgeHit)> = candidates
            .into_iter()
            .filter(|e| match subject {
                Some(s) => e.subject.as_deref().is_some_and(|es| eq_ignore_case(es, s)),
                None => true,
            })
            .map(|e| {
                let similarity = cosine_similarity(&query_embedding, &e.embedding);
                (
                    e.id,
                    similarity,
                    KnowledgeHit {
                        question: e.question.clone(),
                        answer: e.answer.clone(),
                        subject: e.subject.clone(),
                        grade_level: e.grade_level.clone(),
                        similarity,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((top_id, similarity, _)) = scored.first() {
            debug!(top_id, similarity, "Knowledge search top hit");
            let top_id = *top_id;
            if let Some(entry) = tables.knowledge.iter_mut().find(|e| e.id == top_id) {
                entry.usage_count += 1;
                entry.last_accessed = Some(Utc::now());
            }
        }

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, hit)| hit)
            .collect())
    }

    async fn search_app_faqs(
        &self,
        query: &str,
        limit: usize,
        language: Option<&str>,
    ) -> Result<Vec<FaqEntry>> {
        let query_tokens = tokens(query);
        let query_norm = normalized(query);

        let tables = self.tables.read().await;
        let mut scored: Vec<(f32, &AppFaq)> =
            language_filtered(&tables.faqs, language, |f| f.language.as_str())
                .into_iter()
                .map(|faq| (faq_score(&query_tokens, &query_norm, faq), faq))
                .filter(|(score, _)| *score > 0.0)
                .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        debug!(query = %query, matches = scored.len(), "FAQ search");

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, faq)| FaqEntry {
                question: faq.question.clone(),
                answer: faq.answer.clone(),
                category: faq.category.clone(),
            })
            .collect())
    }

    async fn get_syllabus_content(
        &self,
        subject: Option<&str>,
        grade_level: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<SyllabusItem>> {
        let tables = self.tables.read().await;
        Ok(language_filtered(&tables.syllabus, language, |s| s.language.as_str())
            .into_iter()
            .filter(|s| subject.map_or(true, |subj| eq_ignore_case(&s.subject, subj)))
            .filter(|s| grade_level.map_or(true, |g| eq_ignore_case(&s.grade_level, g)))
            .map(|s| SyllabusItem {
                topic: s.topic.clone(),
                content: s.content.clone(),
                subject: s.subject.clone(),
                grade_level: s.grade_level.clone(),
                difficulty: s.difficulty.clone(),
            })
            .collect())
    }
}
