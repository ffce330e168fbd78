//! Specialist education agents and the guarded pipeline that runs them.
//!
//! - **Offline Knowledge**: app help and cached answers; the fallback agent
//! - **Study Assistant**: homework help, explanations, study tips
//! - **Voice Interface**: speech input/output instructions
//! - **Language Support**: translation and localized UI labels
//! - **Assessment**: quizzes and answer evaluation
//! - **Content Discovery**: educational video recommendations
//! - **Study Path Planner**: syllabus-driven learning paths and progress
//! - **Accessibility**: screen reader, contrast and content checks
//!
//! # Architecture
//!
//! Each agent implements [`vidya_common::Agent`] and receives its
//! collaborators at construction. The coordinator never calls an agent
//! directly; it goes through an [`AgentHandle`], which owns the agent's
//! current mode and stats.
//!
//! ```text
//!   query + context
//!         │
//!         ▼
//!  ┌──────────────┐   resolve mode   ┌──────────────────────────┐
//!  │ AgentHandle  │ ───────────────▶ │ process_offline / online │
//!  │ mode, stats, │ ◀─────────────── │   (timeout, no panics)   │
//!  │   timeout    │     Envelope     └──────────────────────────┘
//!  └──────────────┘
//! ```

pub mod accessibility;
pub mod assessment;
pub mod content_discovery;
pub mod handle;
pub mod language;
pub mod offline_knowledge;
pub mod stats;
pub mod study_assistant;
pub mod study_path;
pub mod voice;

pub use accessibility::AccessibilityAgent;
pub use assessment::AssessmentAgent;
pub use content_discovery::ContentDiscoveryAgent;
pub use handle::{AgentHandle, AgentInfo, DEFAULT_AGENT_TIMEOUT};
pub use language::LanguageSupportAgent;
pub use offline_knowledge::OfflineKnowledgeAgent;
pub use stats::AgentStats;
pub use study_assistant::StudyAssistantAgent;
pub use study_path::StudyPathPlannerAgent;
pub use voice::VoiceInterfaceAgent;

/// Case-sensitive substring match; callers lower-case the haystack.
pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
