//! Integration tests for the orchestrator's select, execute and enhance pipeline.
//!
//! These tests use seeded in-memory stores and no remote AI, so they run
//! without network access.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vidya_agents::AgentHandle;
use vidya_common::{
    Agent, AgentMode, AgentPriority, AgentProfile, Enhancement, Envelope, QueryContext, Result,
    VidyaError,
};
use vidya_coordinator::{AgentRegistry, Collaborators, Orchestrator, OrchestratorConfig};
use vidya_knowledge::{
    populate_all, InMemoryContentCache, InMemoryKnowledgeBase, InMemorySyllabusPlanner,
};

/// Helper to create an orchestrator with all standard agents over seeded stores.
async fn create_test_orchestrator() -> Orchestrator {
    let kb = Arc::new(InMemoryKnowledgeBase::with_default_config());
    let planner = Arc::new(InMemorySyllabusPlanner::new());
    populate_all(&kb, &planner).await;

    let collaborators = Collaborators::new()
        .with_knowledge(kb)
        .with_planner(planner)
        .with_cache(Arc::new(InMemoryContentCache::with_default_config()));
    Orchestrator::init(OrchestratorConfig::default(), collaborators).unwrap()
}

#[derive(Clone, Copy)]
enum Behaviour {
    Answer,
    Decline,
    Fail,
    Panic,
    Hang,
    PanicOnScore,
}

/// A mock agent with a fixed score and configurable outcome.
struct SimulatedAgent {
    profile: AgentProfile,
    score: f32,
    behaviour: Behaviour,
    enhancement: Enhancement,
    process_count: Arc<AtomicUsize>,
}

impl SimulatedAgent {
    fn new(id: &str, score: f32) -> Self {
        Self {
            profile: AgentProfile::new(id, format!("Simulated {id}")),
            score,
            behaviour: Behaviour::Answer,
            enhancement: Enhancement::None,
            process_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The agent every test orchestrator falls back to.
    fn fallback() -> Self {
        let mut agent = Self::new("fallback", 0.0);
        agent.profile = agent
            .profile
            .with_priority(AgentPriority::Critical)
            .with_default_mode(AgentMode::Offline);
        agent
    }

    fn with_priority(mut self, priority: AgentPriority) -> Self {
        self.profile = self.profile.with_priority(priority);
        self
    }

    fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    fn with_enhancement(mut self, enhancement: Enhancement) -> Self {
        self.enhancement = enhancement;
        self
    }

    fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.process_count)
    }
}

#[async_trait]
impl Agent for SimulatedAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, _query: &str, _ctx: &QueryContext) -> f32 {
        if let Behaviour::PanicOnScore = self.behaviour {
            panic!("simulated scoring panic");
        }
        self.score
    }

    fn enhancement(&self) -> Enhancement {
        self.enhancement
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        self.process_count.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Answer => Ok(Envelope::answer(format!("{}: {query}", self.profile.id))
                .with("subject", "Science")
                .with("seen_subject", ctx.subject.clone().unwrap_or_default())),
            Behaviour::Decline => Ok(Envelope::failure("nothing here")),
            Behaviour::Fail => Err(VidyaError::Agent("simulated failure".into())),
            Behaviour::Panic | Behaviour::PanicOnScore => panic!("simulated panic"),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Envelope::answer("too late"))
            }
        }
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        if let Behaviour::Answer = self.behaviour {
            self.process_count.fetch_add(1, Ordering::SeqCst);
            return Ok(Envelope::answer(format!("{} online: {query}", self.profile.id)));
        }
        self.process_offline(query, ctx).await
    }
}

fn orchestrator_with(agents: Vec<SimulatedAgent>) -> Orchestrator {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry
            .register(AgentHandle::from_agent(agent).with_timeout(Duration::from_millis(50)))
            .unwrap();
    }
    let config = OrchestratorConfig {
        fallback_agent: "fallback".into(),
        ..Default::default()
    };
    Orchestrator::with_registry(config, registry, Collaborators::new()).unwrap()
}

// ============================================================================
// Selection and fallback
// ============================================================================

#[tokio::test]
async fn app_help_goes_to_offline_knowledge() {
    let orchestrator = create_test_orchestrator().await;
    let ctx = QueryContext::new().with_internet(false);

    let resp = orchestrator.process_query("How do I use this app?", &ctx).await;
    assert!(resp.success, "{resp:?}");
    assert_eq!(resp.agent_id.as_deref(), Some("offline_knowledge"));
    assert_eq!(resp.mode, Some(AgentMode::Offline));
    assert!(resp.total_response_time_ms.is_some());
    assert!(!resp.is_fallback);
}

#[tokio::test]
async fn unmatched_educational_query_needs_internet() {
    let kb = Arc::new(InMemoryKnowledgeBase::with_default_config());
    let orchestrator = Orchestrator::init(
        OrchestratorConfig::default(),
        Collaborators::new().with_knowledge(kb),
    )
    .unwrap();

    let ctx = QueryContext::new().with_internet(false);
    let resp = orchestrator.process_query("What is photosynthesis?", &ctx).await;
    assert!(!resp.success);
    assert!(resp.requires_internet);
}

#[tokio::test]
async fn nothing_confident_uses_fallback() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("other", 0.0),
    ]);

    let resp = orchestrator
        .process_query("xyzzy unknown gibberish", &QueryContext::default())
        .await;
    assert!(resp.is_fallback);
    assert_eq!(resp.agent_id.as_deref(), Some("fallback"));

    let stats = orchestrator.get_stats();
    assert_eq!(stats.total_queries, 1);
    assert_eq!(stats.agent_usage[0].usage_count, 1);
}

#[tokio::test]
async fn fallback_answers_offline_even_when_forced_online() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("other", 0.0),
    ]);
    assert_eq!(orchestrator.set_mode(AgentMode::Online, None), 2);

    let ctx = QueryContext::new().with_internet(true);
    let resp = orchestrator.process_query("xyzzy", &ctx).await;
    assert!(resp.is_fallback);
    assert_eq!(resp.mode, Some(AgentMode::Offline));
    assert_eq!(resp.answer.as_deref(), Some("fallback: xyzzy"));
}

#[tokio::test]
async fn non_critical_fallback_is_rejected() {
    let mut registry = AgentRegistry::new();
    registry
        .register(AgentHandle::from_agent(
            SimulatedAgent::new("fallback", 0.0).with_priority(AgentPriority::Low),
        ))
        .unwrap();
    let config = OrchestratorConfig {
        fallback_agent: "fallback".into(),
        ..Default::default()
    };
    let result = Orchestrator::with_registry(config, registry, Collaborators::new());
    assert!(matches!(result, Err(VidyaError::Config(_))));
}

#[tokio::test]
async fn equal_scores_go_to_more_urgent_priority() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("medium", 0.7).with_priority(AgentPriority::Medium),
        SimulatedAgent::new("critical", 0.7).with_priority(AgentPriority::Critical),
    ]);

    let ranked = orchestrator.select_agents("q", &QueryContext::default());
    assert_eq!(
        ranked,
        vec![("critical".to_string(), 0.7), ("medium".to_string(), 0.7)]
    );
    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert_eq!(resp.agent_id.as_deref(), Some("critical"));
}

#[tokio::test]
async fn standard_agents_score_within_unit_interval() {
    let orchestrator = create_test_orchestrator().await;
    let ctx = QueryContext::new()
        .with_extra("accessibility_mode", true)
        .with_extra("voice_input", true);
    for query in ["", "quiz video study plan translate", "?", "How do I use this app?"] {
        for (_, score) in orchestrator.select_agents(query, &ctx) {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}

// ============================================================================
// Enhancement pass
// ============================================================================

#[tokio::test]
async fn secondaries_enhance_without_overwriting() {
    let videos = SimulatedAgent::new("videos", 0.8)
        .with_enhancement(Enhancement::Invoke { key: "recommended_videos" });
    let videos_runs = videos.counter();
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.95),
        videos,
        SimulatedAgent::new("practice", 0.6)
            .with_enhancement(Enhancement::Flag { key: "practice_available" }),
    ]);

    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert!(resp.success);
    assert_eq!(resp.agent_id.as_deref(), Some("primary"));
    assert_eq!(resp.enhancements["practice_available"], json!(true));
    let attached = &resp.enhancements["recommended_videos"];
    assert_eq!(attached["agent_id"], json!("videos"));
    assert_eq!(attached["seen_subject"], json!("Science"));
    assert_eq!(videos_runs.load(Ordering::SeqCst), 1);

    let stats = orchestrator.get_stats();
    let usage: Vec<u64> = stats.agent_usage.iter().map(|u| u.usage_count).collect();
    assert_eq!(usage, vec![0, 1, 0, 0]);
}

#[tokio::test]
async fn failing_secondary_is_omitted() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.9),
        SimulatedAgent::new("broken", 0.8)
            .with_behaviour(Behaviour::Fail)
            .with_enhancement(Enhancement::Invoke { key: "broken" }),
        SimulatedAgent::new("declines", 0.7)
            .with_behaviour(Behaviour::Decline)
            .with_enhancement(Enhancement::Invoke { key: "declines" }),
    ]);

    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert!(resp.success);
    assert_eq!(resp.answer.as_deref(), Some("primary: q"));
    assert!(resp.enhancements.is_empty());
}

#[tokio::test]
async fn low_confidence_secondaries_are_not_run() {
    let weak = SimulatedAgent::new("weak", 0.5)
        .with_enhancement(Enhancement::Invoke { key: "weak" });
    let weak_runs = weak.counter();
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.9),
        weak,
    ]);

    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert!(resp.enhancements.is_empty());
    assert_eq!(weak_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_primary_skips_enhancement() {
    let helper = SimulatedAgent::new("helper", 0.8)
        .with_enhancement(Enhancement::Invoke { key: "helper" });
    let helper_runs = helper.counter();
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.9).with_behaviour(Behaviour::Decline),
        helper,
    ]);

    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert!(!resp.success);
    assert_eq!(helper_runs.load(Ordering::SeqCst), 0);
    assert_eq!(orchestrator.get_stats().failed_queries, 1);
}

// ============================================================================
// Failure containment and stats
// ============================================================================

#[tokio::test]
async fn panicking_and_hanging_primaries_return_envelopes() {
    for behaviour in [Behaviour::Panic, Behaviour::Hang] {
        let orchestrator = orchestrator_with(vec![
            SimulatedAgent::fallback(),
            SimulatedAgent::new("primary", 0.9).with_behaviour(behaviour),
        ]);
        let resp = orchestrator.process_query("q", &QueryContext::default()).await;
        assert!(!resp.success);
        assert_eq!(resp.agent_id.as_deref(), Some("primary"));
        assert!(resp.error.is_some());
    }
}

#[tokio::test]
async fn scoring_panic_becomes_generic_failure() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("scorer", 0.9).with_behaviour(Behaviour::PanicOnScore),
    ]);

    let resp = orchestrator.process_query("q", &QueryContext::default()).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("internal_error"));
    assert!(resp
        .message
        .as_deref()
        .is_some_and(|m| m.starts_with("Sorry, something went wrong")));
    assert!(resp.agent_id.is_none());
    assert!(resp.total_response_time_ms.is_some());

    let stats = orchestrator.get_stats();
    assert_eq!(stats.total_queries, 1);
    assert_eq!(stats.failed_queries, 1);
    assert!(stats.agent_usage.iter().all(|u| u.usage_count == 0));
}

#[tokio::test]
async fn concurrent_queries_keep_stats_consistent() {
    const QUERIES: usize = 32;
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.9),
    ]);
    let ctx = QueryContext::default();

    let responses = join_all((0..QUERIES).map(|_| orchestrator.process_query("q", &ctx))).await;
    assert!(responses.iter().all(|r| r.success));

    let stats = orchestrator.get_stats();
    assert_eq!(stats.total_queries, QUERIES as u64);
    assert_eq!(stats.successful_queries + stats.failed_queries, stats.total_queries);

    let info = orchestrator.get_agent("primary").unwrap();
    assert_eq!(info.stats.total_requests, QUERIES as u64);
    assert_eq!(
        info.stats.successful_responses + info.stats.failed_responses,
        info.stats.total_requests
    );
}

#[tokio::test]
async fn agent_stats_add_up() {
    let orchestrator = orchestrator_with(vec![
        SimulatedAgent::fallback(),
        SimulatedAgent::new("primary", 0.9),
    ]);
    for _ in 0..4 {
        orchestrator.process_query("q", &QueryContext::default()).await;
    }

    let info = orchestrator.get_agent("primary").unwrap();
    assert_eq!(info.stats.total_requests, 4);
    assert_eq!(
        info.stats.successful_responses + info.stats.failed_responses,
        info.stats.total_requests
    );

    let stats = orchestrator.get_stats();
    assert_eq!(stats.success_rate, 100.0);

    orchestrator.reset_stats();
    assert_eq!(orchestrator.get_stats().total_queries, 0);
    assert_eq!(orchestrator.get_agent("primary").unwrap().stats.total_requests, 0);
}

#[tokio::test]
async fn quiz_flows_through_orchestrator() {
    let orchestrator = create_test_orchestrator().await;
    let ctx = QueryContext::new()
        .with_internet(false)
        .with_subject("Mathematics")
        .with_extra("difficulty", "medium")
        .with_extra("count", 2);

    let resp = orchestrator.process_query("Give me a quiz", &ctx).await;
    assert!(resp.success, "{resp:?}");
    assert_eq!(resp.agent_id.as_deref(), Some("assessment"));
    assert_eq!(resp.get("question_count"), Some(&json!(2)));
}

#[tokio::test]
async fn health_lists_every_agent_and_tool() {
    let orchestrator = create_test_orchestrator().await;
    let health = orchestrator.health_check();
    assert_eq!(health.agents.len(), 8);
    assert!(health.agents.values().all(|s| s == "healthy"));
    assert_eq!(health.tools["knowledge_base"], "available");
    assert_eq!(health.tools["video_search"], "not_initialized");

    orchestrator.shutdown();
    assert_eq!(orchestrator.health_check().orchestrator, "shut_down");
}
