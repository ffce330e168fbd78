//! Integration tests for the specialist agents.
//!
//! Agents run through `AgentHandle` against seeded in-memory stores, so the
//! whole offline path is exercised without any network access.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vidya_agents::{
    AgentHandle, AssessmentAgent, ContentDiscoveryAgent, OfflineKnowledgeAgent,
    StudyAssistantAgent, StudyPathPlannerAgent,
};
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentProfile, Envelope, QueryContext, Result, VidyaError,
};
use vidya_knowledge::{
    populate_all, InMemoryContentCache, InMemoryKnowledgeBase, InMemorySyllabusPlanner,
};
use vidya_llm::{LlmClient, LlmRequest, LlmResponse};

struct Stores {
    kb: Arc<InMemoryKnowledgeBase>,
    planner: Arc<InMemorySyllabusPlanner>,
    cache: Arc<InMemoryContentCache>,
}

async fn seeded() -> Stores {
    let kb = Arc::new(InMemoryKnowledgeBase::with_default_config());
    let planner = Arc::new(InMemorySyllabusPlanner::new());
    populate_all(&kb, &planner).await;
    Stores {
        kb,
        planner,
        cache: Arc::new(InMemoryContentCache::with_default_config()),
    }
}

/// LLM stand-in that either replies with a fixed text or always errors.
struct ScriptedLlm {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn broken() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(content) => Ok(LlmResponse {
                content: content.clone(),
                model: "scripted".to_string(),
                usage: None,
                finish_reason: Some("stop".to_string()),
            }),
            None => Err(VidyaError::Http {
                status: 503,
                body: "overloaded".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// A mock agent with configurable latency and failure.
struct SimulatedAgent {
    profile: AgentProfile,
    reply: String,
    delay: Duration,
    should_fail: bool,
    process_count: AtomicUsize,
}

impl SimulatedAgent {
    fn new(id: &str, reply: &str) -> Self {
        Self {
            profile: AgentProfile::new(id, format!("Simulated {id}"))
                .with_capabilities(vec![AgentCapability::TextProcessing]),
            reply: reply.to_string(),
            delay: Duration::from_millis(5),
            should_fail: false,
            process_count: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    fn process_count(&self) -> usize {
        self.process_count.load(Ordering::SeqCst)
    }

    async fn run(&self, query: &str, mode: &str) -> Result<Envelope> {
        self.process_count.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.should_fail {
            return Err(VidyaError::Agent(format!("{} refused", self.profile.id)));
        }
        Ok(Envelope::answer(format!("{} {query}", self.reply)).with("path", mode))
    }
}

#[async_trait]
impl Agent for SimulatedAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, _query: &str, _ctx: &QueryContext) -> f32 {
        0.5
    }

    async fn process_offline(&self, query: &str, _ctx: &QueryContext) -> Result<Envelope> {
        self.run(query, "offline").await
    }

    async fn process_online(&self, query: &str, _ctx: &QueryContext) -> Result<Envelope> {
        self.run(query, "online").await
    }
}

// ============================================================================
// Handle pipeline
// ============================================================================

#[tokio::test]
async fn handle_routes_by_mode_and_counts() {
    let agent = Arc::new(SimulatedAgent::new("sim", "echo:"));
    let handle = AgentHandle::new(agent.clone());

    let online = QueryContext::new().with_internet(true);
    let resp = handle.process("hi", &online, None).await;
    assert!(resp.success);
    assert_eq!(resp.get_str("path"), Some("online"));
    assert_eq!(resp.mode, Some(AgentMode::Online));

    let resp = handle
        .process("hi", &online, Some(AgentMode::Offline))
        .await;
    assert_eq!(resp.get_str("path"), Some("offline"));
    assert_eq!(resp.answer.as_deref(), Some("echo: hi"));

    let stats = handle.stats();
    assert_eq!(agent.process_count(), 2);
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.online_requests, 1);
    assert_eq!(stats.offline_requests, 1);
    assert_eq!(stats.successful_responses, 2);
}

#[tokio::test]
async fn failing_and_slow_agents_become_failure_envelopes() {
    let failing = AgentHandle::from_agent(SimulatedAgent::new("bad", "").failing());
    let resp = failing.process("hi", &QueryContext::default(), None).await;
    assert!(!resp.success);
    assert_eq!(resp.agent_id.as_deref(), Some("bad"));
    assert!(resp.error.as_deref().unwrap_or_default().contains("bad refused"));
    assert_eq!(failing.stats().failed_responses, 1);

    let slow = AgentHandle::from_agent(
        SimulatedAgent::new("slow", "").with_delay(Duration::from_millis(500)),
    )
    .with_timeout(Duration::from_millis(20));
    let resp = slow.process("hi", &QueryContext::default(), None).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Agent timed out after 20 ms"));
}

// ============================================================================
// Offline knowledge and study assistant
// ============================================================================

#[tokio::test]
async fn app_help_is_answered_offline() {
    let stores = seeded().await;
    let handle =
        AgentHandle::from_agent(OfflineKnowledgeAgent::new().with_knowledge(stores.kb.clone()));

    let ctx = QueryContext::new().with_internet(false);
    assert!(handle.can_handle("How do I use this app?", &ctx) >= 0.9);

    let resp = handle.process("How do I use this app?", &ctx, None).await;
    assert!(resp.success, "{resp:?}");
    assert_eq!(resp.get_str("source"), Some("offline_faq"));
    assert_eq!(resp.get_str("category"), Some("navigation"));
    assert_eq!(resp.mode, Some(AgentMode::Offline));
    assert!(resp.response_time_ms.is_some());
}

#[tokio::test]
async fn study_assistant_answers_cached_question() {
    let stores = seeded().await;
    let handle =
        AgentHandle::from_agent(StudyAssistantAgent::new().with_knowledge(stores.kb.clone()));

    let resp = handle
        .process("What is photosynthesis?", &QueryContext::default(), None)
        .await;
    assert!(resp.success, "{resp:?}");
    assert_eq!(resp.get_str("source"), Some("cached_knowledge"));
    assert_eq!(resp.get_str("subject"), Some("Science"));
}

#[tokio::test]
async fn study_assistant_without_match_asks_for_internet() {
    let stores = seeded().await;
    let handle =
        AgentHandle::from_agent(StudyAssistantAgent::new().with_knowledge(stores.kb.clone()));

    let resp = handle
        .process("xylophone quokka zeppelin", &QueryContext::default(), None)
        .await;
    assert!(!resp.success);
    assert!(resp.requires_internet);
}

#[tokio::test]
async fn remote_failure_falls_back_with_note() {
    let stores = seeded().await;
    let llm = Arc::new(ScriptedLlm::broken());
    let handle = AgentHandle::from_agent(
        StudyAssistantAgent::new()
            .with_knowledge(stores.kb.clone())
            .with_llm(llm.clone()),
    );

    let ctx = QueryContext::new().with_internet(true);
    let resp = handle.process("What is photosynthesis?", &ctx, None).await;
    assert_eq!(llm.calls(), 1);
    assert!(resp.success);
    assert_eq!(resp.mode, Some(AgentMode::Online));
    assert_eq!(
        resp.get_str("note"),
        Some("Online AI unavailable, using cached content")
    );
}

#[tokio::test]
async fn remote_answer_is_used_when_available() {
    let stores = seeded().await;
    let llm = Arc::new(ScriptedLlm::replying("Plants turn light into sugar."));
    let handle = AgentHandle::from_agent(
        StudyAssistantAgent::new()
            .with_knowledge(stores.kb.clone())
            .with_llm(llm.clone()),
    );

    let ctx = QueryContext::new().with_internet(true);
    let resp = handle.process("Explain photosynthesis", &ctx, None).await;
    assert!(resp.success);
    assert_eq!(resp.answer.as_deref(), Some("Plants turn light into sugar."));
    assert!(resp.get("note").is_none());
}

// ============================================================================
// Assessment, study paths and content discovery
// ============================================================================

#[tokio::test]
async fn offline_quiz_numbers_questions() {
    let handle = AgentHandle::from_agent(AssessmentAgent::new());
    let ctx = QueryContext::new()
        .with_subject("Mathematics")
        .with_extra("difficulty", "medium")
        .with_extra("count", 2);

    let resp = handle.process("Give me a quiz", &ctx, None).await;
    assert!(resp.success);
    let ids: Vec<u64> = resp
        .get("questions")
        .and_then(|q| q.as_array())
        .map(|qs| qs.iter().filter_map(|q| q["id"].as_u64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn study_path_lifecycle() {
    let stores = seeded().await;
    let handle =
        AgentHandle::from_agent(StudyPathPlannerAgent::new().with_planner(stores.planner.clone()));
    let base = QueryContext::new()
        .with_user("asha")
        .with_subject("Science")
        .with_grade_level("10");

    let resp = handle.process("Make me a study plan", &base, None).await;
    assert!(resp.success, "{resp:?}");
    let path = resp.get("study_path").cloned().unwrap_or_default();
    assert_eq!(path["total_topics"], json!(7));
    let path_id = path["path_id"].as_u64().unwrap();
    let first = path["topics"][0]["topic"].as_str().unwrap().to_string();

    let again = handle.process("Make me a study plan", &base, None).await;
    assert_eq!(again.get("has_existing_path"), Some(&json!(true)));

    let next_ctx = base
        .clone()
        .with_operation("next_topic")
        .with_extra("path_id", path_id);
    let next = handle.process("", &next_ctx, None).await;
    assert_eq!(next.get("next_topic").unwrap()["topic"], json!(first));

    let done_ctx = base
        .clone()
        .with_operation("update_progress")
        .with_extra("path_id", path_id)
        .with_extra("topic", first.clone())
        .with_extra("status", "completed")
        .with_extra("time_spent", 45);
    let done = handle.process("", &done_ctx, None).await;
    assert!(done.success);
    assert_eq!(done.get("completed_topics"), Some(&json!(1)));

    let next = handle.process("", &next_ctx, None).await;
    assert_ne!(next.get("next_topic").unwrap()["topic"], json!(first));
}

#[tokio::test]
async fn cached_videos_are_served_offline() {
    let stores = seeded().await;
    let handle =
        AgentHandle::from_agent(ContentDiscoveryAgent::new().with_cache(stores.cache.clone()));

    let store_ctx = QueryContext::new()
        .with_operation("cache_videos")
        .with_subject("Science")
        .with_extra(
            "videos",
            json!([{ "video_id": "v1", "title": "Light and lenses" }]),
        );
    let stored = handle.process("", &store_ctx, None).await;
    assert!(stored.success);
    assert_eq!(stored.get("cached_count"), Some(&json!(1)));

    let ctx = QueryContext::new()
        .with_subject("Science")
        .with_internet(false);
    let resp = handle.process("Recommend a video", &ctx, None).await;
    assert!(resp.success);
    assert_eq!(
        resp.get("cached_videos").unwrap()[0]["title"],
        json!("Light and lenses")
    );
}
