//! The standard agent set and the collaborators injected into it.

use std::sync::Arc;

use tracing::{info, warn};
use vidya_agents::{
    AccessibilityAgent, AgentHandle, AssessmentAgent, ContentDiscoveryAgent,
    LanguageSupportAgent, OfflineKnowledgeAgent, StudyAssistantAgent, StudyPathPlannerAgent,
    VoiceInterfaceAgent,
};
use vidya_common::{ContentCache, KnowledgeLookup, Result, StudyPlanner, VideoSearch};
use vidya_llm::{build_llm_client, LlmClient};

use crate::config::OrchestratorConfig;
use crate::registry::AgentRegistry;

/// Optional collaborators handed to agents at construction time.
///
/// Anything left unset degrades the agents that need it to their offline
/// behaviour.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub knowledge: Option<Arc<dyn KnowledgeLookup>>,
    pub cache: Option<Arc<dyn ContentCache>>,
    pub planner: Option<Arc<dyn StudyPlanner>>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub video_search: Option<Arc<dyn VideoSearch>>,
    pub speech_key: Option<String>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeLookup>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_planner(mut self, planner: Arc<dyn StudyPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_video_search(mut self, video_search: Arc<dyn VideoSearch>) -> Self {
        self.video_search = Some(video_search);
        self
    }

    pub fn with_speech_key(mut self, key: impl Into<String>) -> Self {
        self.speech_key = Some(key.into());
        self
    }

    /// Fill in remote collaborators from configuration where none were
    /// supplied explicitly.
    pub fn resolve_remote(mut self, config: &OrchestratorConfig) -> Self {
        if self.llm.is_none() {
            if let Some(llm_config) = &config.llm {
                match build_llm_client(llm_config) {
                    Ok(client) => {
                        info!(
                            provider = %llm_config.provider,
                            model = %llm_config.model,
                            "Remote AI client initialized"
                        );
                        self.llm = Some(client);
                    }
                    Err(e) => {
                        warn!(error = %e, "Remote AI unavailable, online paths will fall back");
                    }
                }
            }
        }
        if self.speech_key.is_none() {
            self.speech_key = config.speech.resolve_api_key();
        }
        self
    }

    /// Availability of each collaborator for the health view.
    pub fn availability(&self) -> [(&'static str, bool); 5] {
        [
            ("knowledge_base", self.knowledge.is_some()),
            ("cache_manager", self.cache.is_some()),
            ("syllabus_parser", self.planner.is_some()),
            ("remote_ai", self.llm.is_some()),
            ("video_search", self.video_search.is_some()),
        ]
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Collaborators");
        for (name, present) in self.availability() {
            s.field(name, &present);
        }
        s.field("speech_key", &self.speech_key.is_some()).finish()
    }
}

/// Build the eight standard agents, in registry order.
pub fn build_registry(
    config: &OrchestratorConfig,
    collaborators: &Collaborators,
) -> Result<AgentRegistry> {
    let min_similarity = config.knowledge.min_similarity;

    let mut offline = OfflineKnowledgeAgent::new().with_min_similarity(min_similarity);
    let mut study = StudyAssistantAgent::new().with_min_similarity(min_similarity);
    if let Some(kb) = &collaborators.knowledge {
        offline = offline.with_knowledge(Arc::clone(kb));
        study = study.with_knowledge(Arc::clone(kb));
    }

    let mut language = LanguageSupportAgent::new();
    let mut assessment = AssessmentAgent::new();
    if let Some(llm) = &collaborators.llm {
        study = study.with_llm(Arc::clone(llm));
        language = language.with_llm(Arc::clone(llm));
        assessment = assessment.with_llm(Arc::clone(llm));
    }

    let mut voice = VoiceInterfaceAgent::new();
    if let Some(key) = &collaborators.speech_key {
        voice = voice.with_speech_key(key.clone());
    }

    let mut content = ContentDiscoveryAgent::new();
    if let Some(cache) = &collaborators.cache {
        content = content.with_cache(Arc::clone(cache));
    }
    if let Some(search) = &collaborators.video_search {
        content = content.with_video_search(Arc::clone(search));
    }

    let mut planner = StudyPathPlannerAgent::new();
    if let Some(p) = &collaborators.planner {
        planner = planner.with_planner(Arc::clone(p));
    }

    let timeout = config.agent_timeout();
    let handles = [
        AgentHandle::from_agent(offline),
        AgentHandle::from_agent(study),
        AgentHandle::from_agent(voice),
        AgentHandle::from_agent(language),
        AgentHandle::from_agent(assessment),
        AgentHandle::from_agent(content),
        AgentHandle::from_agent(planner),
        AgentHandle::from_agent(AccessibilityAgent::new()),
    ];

    let mut registry = AgentRegistry::new();
    for handle in handles {
        registry.register(handle.with_timeout(timeout))?;
    }
    Ok(registry)
}
