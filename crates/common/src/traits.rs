//! Core agent contract: modes, priorities, capabilities and the `Agent` trait.
//!
//! These live in `vidya-common` so the agent crate and the coordinator can
//! both reference them without a dependency cycle.

use crate::{Envelope, QueryContext, Result, VidyaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an agent does its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Local state only.
    Offline,
    /// May call remote collaborators.
    Online,
    /// Decide per request from the context's connectivity signal.
    Auto,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Offline => "offline",
            AgentMode::Online => "online",
            AgentMode::Auto => "auto",
        }
    }

    /// Collapse `Auto` into a concrete mode.
    ///
    /// An explicit `has_internet` in the context is trusted; without it the
    /// result is `Offline`. Concrete modes pass through unchanged.
    pub fn resolve(self, ctx: &QueryContext) -> AgentMode {
        match self {
            AgentMode::Auto => {
                if ctx.has_internet == Some(true) {
                    AgentMode::Online
                } else {
                    AgentMode::Offline
                }
            }
            concrete => concrete,
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = VidyaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "offline" => Ok(AgentMode::Offline),
            "online" => Ok(AgentMode::Online),
            "auto" => Ok(AgentMode::Auto),
            other => Err(VidyaError::Config(format!("Unknown agent mode: {other}"))),
        }
    }
}

/// Tie-break rank used by the selector. Lower ordinal wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl AgentPriority {
    pub fn ordinal(&self) -> u8 {
        match self {
            AgentPriority::Critical => 1,
            AgentPriority::High => 2,
            AgentPriority::Medium => 3,
            AgentPriority::Low => 4,
        }
    }
}

/// Capabilities that an agent can declare.
///
/// Used for discovery, never for selection math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCapability {
    TextProcessing,
    VoiceProcessing,
    ImageProcessing,
    VideoRecommendation,
    ContentGeneration,
    LearningPath,
    Assessment,
    Translation,
    Accessibility,
}

impl AgentCapability {
    pub const ALL: [AgentCapability; 9] = [
        AgentCapability::TextProcessing,
        AgentCapability::VoiceProcessing,
        AgentCapability::ImageProcessing,
        AgentCapability::VideoRecommendation,
        AgentCapability::ContentGeneration,
        AgentCapability::LearningPath,
        AgentCapability::Assessment,
        AgentCapability::Translation,
        AgentCapability::Accessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentCapability::TextProcessing => "text_processing",
            AgentCapability::VoiceProcessing => "voice_processing",
            AgentCapability::ImageProcessing => "image_processing",
            AgentCapability::VideoRecommendation => "video_recommendation",
            AgentCapability::ContentGeneration => "content_generation",
            AgentCapability::LearningPath => "learning_path",
            AgentCapability::Assessment => "assessment",
            AgentCapability::Translation => "translation",
            AgentCapability::Accessibility => "accessibility",
        }
    }
}

impl FromStr for AgentCapability {
    type Err = VidyaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        AgentCapability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == wanted)
            .ok_or_else(|| VidyaError::Config(format!("Unknown capability: {s}")))
    }
}

/// Static identity of an agent. `id` never changes after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<AgentCapability>,
    pub priority: AgentPriority,
    pub default_mode: AgentMode,
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            capabilities: Vec::new(),
            priority: AgentPriority::Medium,
            default_mode: AgentMode::Auto,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<AgentCapability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_priority(mut self, priority: AgentPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_default_mode(mut self, mode: AgentMode) -> Self {
        self.default_mode = mode;
        self
    }
}

/// What a secondary agent adds to a successful primary response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enhancement {
    /// Contributes nothing.
    None,
    /// Run the agent and attach its successful envelope under `key`.
    Invoke { key: &'static str },
    /// Attach `true` under `key` without running the agent.
    Flag { key: &'static str },
}

/// The contract every specialist agent implements.
///
/// Callers never invoke the two paths directly; the agent handle in
/// `vidya-agents` wraps them with mode resolution, timing and stats.
#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    fn id(&self) -> &str {
        &self.profile().id
    }

    fn name(&self) -> &str {
        &self.profile().name
    }

    fn capabilities(&self) -> &[AgentCapability] {
        &self.profile().capabilities
    }

    fn has_capability(&self, cap: AgentCapability) -> bool {
        self.capabilities().contains(&cap)
    }

    /// Confidence in [0, 1] that this agent should answer. Must be pure.
    ///
    /// The default declines everything, so an agent that does not override
    /// this is never selected.
    fn can_handle(&self, _query: &str, _ctx: &QueryContext) -> f32 {
        0.0
    }

    /// Contribution when ranked behind a successful primary.
    fn enhancement(&self) -> Enhancement {
        Enhancement::None
    }

    /// Answer from local state only. Insufficient data is `success: false`,
    /// not an error.
    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope>;

    /// Answer using remote collaborators. Transport or credential problems
    /// fall back to [`Agent::process_offline`].
    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_without_signal_is_offline() {
        let ctx = QueryContext::default();
        assert_eq!(AgentMode::Auto.resolve(&ctx), AgentMode::Offline);
    }

    #[test]
    fn auto_trusts_explicit_signal() {
        let online = QueryContext::new().with_internet(true);
        let offline = QueryContext::new().with_internet(false);
        assert_eq!(AgentMode::Auto.resolve(&online), AgentMode::Online);
        assert_eq!(AgentMode::Auto.resolve(&offline), AgentMode::Offline);
    }

    #[test]
    fn concrete_modes_ignore_context() {
        let ctx = QueryContext::new().with_internet(true);
        assert_eq!(AgentMode::Offline.resolve(&ctx), AgentMode::Offline);
        let ctx = QueryContext::new().with_internet(false);
        assert_eq!(AgentMode::Online.resolve(&ctx), AgentMode::Online);
    }

    #[test]
    fn mode_parsing_and_serde() {
        assert_eq!("OFFLINE".parse::<AgentMode>().unwrap(), AgentMode::Offline);
        assert_eq!(" auto ".parse::<AgentMode>().unwrap(), AgentMode::Auto);
        assert!("sometimes".parse::<AgentMode>().is_err());
        assert_eq!(
            serde_json::to_string(&AgentMode::Online).unwrap(),
            "\"online\""
        );
    }

    #[test]
    fn priority_ordinals() {
        assert_eq!(AgentPriority::Critical.ordinal(), 1);
        assert_eq!(AgentPriority::High.ordinal(), 2);
        assert_eq!(AgentPriority::Medium.ordinal(), 3);
        assert_eq!(AgentPriority::Low.ordinal(), 4);
    }

    #[test]
    fn capability_names_round_trip_through_from_str() {
        for cap in AgentCapability::ALL {
            assert_eq!(cap.as_str().parse::<AgentCapability>().unwrap(), cap);
            let json = serde_json::to_string(&cap).unwrap();
            assert_eq!(json, format!("\"{}\"", cap.as_str()));
        }
        assert!("telepathy".parse::<AgentCapability>().is_err());
    }

    struct Silent {
        profile: AgentProfile,
    }

    #[async_trait]
    impl Agent for Silent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        async fn process_offline(&self, _query: &str, _ctx: &QueryContext) -> Result<Envelope> {
            Ok(Envelope::message("offline"))
        }

        async fn process_online(&self, _query: &str, _ctx: &QueryContext) -> Result<Envelope> {
            Ok(Envelope::message("online"))
        }
    }

    #[test]
    fn default_can_handle_declines() {
        let agent = Silent {
            profile: AgentProfile::new("silent", "Silent Agent")
                .with_capabilities(vec![AgentCapability::Translation]),
        };
        assert_eq!(agent.can_handle("anything at all?", &QueryContext::default()), 0.0);
        assert_eq!(agent.enhancement(), Enhancement::None);
        assert!(agent.has_capability(AgentCapability::Translation));
        assert!(!agent.has_capability(AgentCapability::Assessment));
        assert_eq!(agent.id(), "silent");
    }
}
