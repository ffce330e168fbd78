//! Interfaces of the stores and services agents depend on.
//!
//! Agents receive these as `Arc<dyn ...>` at construction. In-process
//! implementations live in `vidya-knowledge`; tests substitute doubles.

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One ranked hit from the Q&A knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusItem {
    pub topic: String,
    pub content: String,
    pub subject: String,
    pub grade_level: String,
    pub difficulty: String,
}

#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// Q&A entries ranked by descending similarity.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        language: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Vec<KnowledgeHit>>;

    async fn search_app_faqs(
        &self,
        query: &str,
        limit: usize,
        language: Option<&str>,
    ) -> Result<Vec<FaqEntry>>;

    async fn get_syllabus_content(
        &self,
        subject: Option<&str>,
        grade_level: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<SyllabusItem>>;
}

/// A live cache entry. `data` is the parsed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedContent {
    pub content_type: String,
    pub content_id: String,
    pub data: Value,
    pub size_bytes: usize,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_count: u64,
}

#[async_trait]
pub trait ContentCache: Send + Sync {
    /// `None` when absent or expired.
    async fn get_cached_content(
        &self,
        content_type: &str,
        content_id: &str,
    ) -> Result<Option<CachedContent>>;

    async fn save_downloaded_content(
        &self,
        content_type: &str,
        content_id: &str,
        data: Value,
        expires_hours: u64,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    NotStarted,
    InProgress,
    Completed,
    NeedsReview,
}

impl TopicStatus {
    /// Lenient parse for user-supplied status strings; unknown values mean
    /// the topic is in progress.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" => TopicStatus::Completed,
            "not_started" => TopicStatus::NotStarted,
            "needs_review" => TopicStatus::NeedsReview,
            _ => TopicStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusTopic {
    pub id: u64,
    pub subject: String,
    pub grade_level: String,
    pub board: String,
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f32>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPathRequest {
    pub user_id: String,
    pub subject: String,
    pub grade_level: String,
    pub available_hours_per_week: f32,
    pub target_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPath {
    pub path_id: u64,
    pub total_topics: usize,
    pub estimated_hours: f32,
    pub weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPathItem {
    pub topic_id: u64,
    pub topic: String,
    pub sequence_order: usize,
    pub status: TopicStatus,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPathDetails {
    pub path_id: u64,
    pub user_id: String,
    pub path_name: String,
    pub subject: String,
    pub grade_level: String,
    pub duration_days: u32,
    pub items: Vec<StudyPathItem>,
    pub completed_topics: usize,
    pub total_topics: usize,
    pub progress_percentage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub user_id: String,
    pub subject: String,
    pub topic: String,
    pub status: TopicStatus,
    pub time_spent_minutes: u32,
    pub mastery_level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTopic {
    pub topic: String,
    pub subject: String,
    pub last_studied: DateTime<Utc>,
    pub mastery_level: Option<u8>,
    pub review_due: DateTime<Utc>,
}

#[async_trait]
pub trait StudyPlanner: Send + Sync {
    async fn get_syllabus_topics(
        &self,
        subject: Option<&str>,
        grade_level: Option<&str>,
    ) -> Result<Vec<SyllabusTopic>>;

    /// Fails when the subject/grade has no topics.
    async fn generate_optimal_study_path(&self, request: &StudyPathRequest)
        -> Result<GeneratedPath>;

    async fn get_study_path_details(&self, path_id: u64) -> Result<Option<StudyPathDetails>>;

    async fn get_user_paths(
        &self,
        user_id: &str,
        subject: Option<&str>,
    ) -> Result<Vec<StudyPathDetails>>;

    async fn update_topic_progress(&self, update: ProgressUpdate) -> Result<()>;

    /// First item of the path that is not completed.
    async fn get_next_topic(&self, path_id: u64) -> Result<Option<StudyPathItem>>;

    async fn get_topics_due_for_review(
        &self,
        user_id: &str,
        subject: Option<&str>,
    ) -> Result<Vec<ReviewTopic>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Remote educational video search.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search_videos(
        &self,
        query: &str,
        language: &str,
        max_results: usize,
    ) -> Result<Vec<VideoItem>>;
}
