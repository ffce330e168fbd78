//! Common types and traits shared across vidya crates.
//!
//! This crate provides the agent contract, the per-request context, the
//! response envelope and the collaborator interfaces that every agent and
//! the coordinator speak.

pub mod collaborators;
pub mod context;
pub mod envelope;
pub mod error;
pub mod traits;

pub use collaborators::{
    CachedContent, ContentCache, Difficulty, FaqEntry, GeneratedPath, KnowledgeHit,
    KnowledgeLookup, ProgressUpdate, ReviewTopic, StudyPathDetails, StudyPathItem,
    StudyPathRequest, StudyPlanner, SyllabusItem, SyllabusTopic, TopicStatus, VideoItem,
    VideoSearch,
};
pub use context::QueryContext;
pub use envelope::Envelope;
pub use error::{Result, VidyaError};
pub use traits::{Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Enhancement};
