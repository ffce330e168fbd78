//! Content discovery agent - educational video recommendations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, ContentCache, Enhancement,
    Envelope, QueryContext, Result, VideoSearch,
};

use crate::contains_any;

pub const ID: &str = "content_discovery";

/// Cache content type for stored recommendations, keyed by subject.
pub const RECOMMENDATIONS_CACHE: &str = "youtube_recommendations";
pub const RECOMMENDATIONS_TTL_HOURS: u64 = 48;

const CONTENT_KEYWORDS: &[&str] = &[
    "video",
    "youtube",
    "watch",
    "learn from",
    "recommend",
    "tutorial",
    "lecture",
    "explanation",
];

const DEFAULT_SUBJECT: &str = "Mathematics";
const DEFAULT_MAX_RESULTS: u64 = 10;

fn channels(subject: &str) -> &'static [&'static str] {
    match subject {
        "Science" => &["Khan Academy", "Crash Course", "Vedantu", "Byju's"],
        "Social Science" => &["Unacademy", "Study IQ", "Khan Academy"],
        _ => &["Khan Academy", "Vedantu", "Unacademy", "Physics Wallah"],
    }
}

pub struct ContentDiscoveryAgent {
    profile: AgentProfile,
    cache: Option<Arc<dyn ContentCache>>,
    video_search: Option<Arc<dyn VideoSearch>>,
}

impl ContentDiscoveryAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Content Discovery Agent")
                .with_description("Discovers and recommends educational videos and content")
                .with_capabilities(vec![
                    AgentCapability::VideoRecommendation,
                    AgentCapability::ContentGeneration,
                ])
                .with_priority(AgentPriority::Medium)
                .with_default_mode(AgentMode::Auto),
            cache: None,
            video_search: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_video_search(mut self, video_search: Arc<dyn VideoSearch>) -> Self {
        self.video_search = Some(video_search);
        self
    }

    async fn cached_videos(&self, subject: &str) -> Vec<Value> {
        let Some(cache) = self.cache.as_deref() else {
            return Vec::new();
        };
        match cache.get_cached_content(RECOMMENDATIONS_CACHE, subject).await {
            Ok(Some(hit)) => hit
                .data
                .get("videos")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(agent = ID, error = %e, "Could not read cached videos");
                Vec::new()
            }
        }
    }

    async fn store_videos(&self, subject: &str, videos: Vec<Value>) -> Result<usize> {
        let Some(cache) = self.cache.as_deref() else {
            return Ok(0);
        };
        let count = videos.len();
        cache
            .save_downloaded_content(
                RECOMMENDATIONS_CACHE,
                subject,
                json!({ "videos": videos, "subject": subject }),
                RECOMMENDATIONS_TTL_HOURS,
            )
            .await?;
        Ok(count)
    }

    async fn recommend_offline(&self, ctx: &QueryContext) -> Envelope {
        let subject = subject(ctx);
        let videos = self.cached_videos(subject).await;
        Envelope::message("Showing cached recommendations. Connect to internet for latest videos.")
            .with_suggestion(format!("Search for \"{subject} tutorial\" on YouTube when online"))
            .with("subject", subject)
            .with("recommended_channels", channels(subject).to_vec())
            .with("cached_videos", videos)
    }

    async fn search(
        &self,
        search: &dyn VideoSearch,
        query: &str,
        ctx: &QueryContext,
    ) -> Result<Envelope> {
        let subject = subject(ctx);
        let topic = ctx.get_str("topic").unwrap_or(query);
        let max_results = ctx.get_u64("max_results").unwrap_or(DEFAULT_MAX_RESULTS) as usize;

        let found = search.search_videos(topic, ctx.language(), max_results).await?;
        debug!(agent = ID, count = found.len(), "Video search returned results");
        let videos: Vec<Value> = found
            .into_iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<_, _>>()?;

        if let Err(e) = self.store_videos(subject, videos.clone()).await {
            warn!(agent = ID, error = %e, "Could not cache video recommendations");
        }

        Ok(Envelope::message(format!("Found {} videos for {topic}", videos.len()))
            .with("query", topic)
            .with("subject", subject)
            .with("videos", videos)
            .with("source", "video_search"))
    }

    async fn cache_supplied_videos(&self, ctx: &QueryContext) -> Result<Envelope> {
        if self.cache.is_none() {
            return Ok(Envelope::failure("Videos cannot be saved for offline use")
                .with_error("Cache manager not available"));
        }
        let subject = subject(ctx);
        let videos = ctx
            .get("videos")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let cached = self.store_videos(subject, videos).await?;
        Ok(Envelope::message(format!("Saved {cached} videos for offline use"))
            .with("cached_count", cached)
            .with("subject", subject))
    }
}

impl Default for ContentDiscoveryAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn subject(ctx: &QueryContext) -> &str {
    ctx.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
}

#[async_trait]
impl Agent for ContentDiscoveryAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, _ctx: &QueryContext) -> f32 {
        if contains_any(&query.to_lowercase(), CONTENT_KEYWORDS) {
            0.85
        } else {
            0.3
        }
    }

    fn enhancement(&self) -> Enhancement {
        Enhancement::Invoke {
            key: "recommended_videos",
        }
    }

    async fn process_offline(&self, _query: &str, ctx: &QueryContext) -> Result<Envelope> {
        if ctx.operation_or("recommend") == "cache_videos" {
            return self.cache_supplied_videos(ctx).await;
        }
        Ok(self.recommend_offline(ctx).await)
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        if ctx.operation_or("recommend") == "cache_videos" {
            return self.cache_supplied_videos(ctx).await;
        }
        let Some(search) = self.video_search.as_deref() else {
            return Ok(self.recommend_offline(ctx).await);
        };
        match self.search(search, query, ctx).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!(agent = ID, error = %e, "Video search failed, using cached recommendations");
                Ok(self.recommend_offline(ctx).await)
            }
        }
    }
}
