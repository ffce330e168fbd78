//! Offline collaborators for vidya.
//!
//! Everything here runs in-process with no network or disk access:
//!
//! - **Knowledge base**: cached Q&A with hashed-embedding similarity search,
//!   app FAQs with keyword scoring, and syllabus content summaries
//! - **Content cache**: downloaded payloads with expiry and a size budget
//! - **Syllabus planner**: parsed syllabi, prerequisite-aware study paths
//!   and spaced-repetition progress tracking
//!
//! Each store implements the matching collaborator trait from
//! `vidya-common`, so agents only ever see `Arc<dyn KnowledgeLookup>` and
//! friends.

pub mod cache;
pub mod embedding;
pub mod knowledge_base;
pub mod seed;
pub mod syllabus;
pub mod types;

pub use cache::InMemoryContentCache;
pub use embedding::HashEmbedder;
pub use knowledge_base::InMemoryKnowledgeBase;
pub use seed::{populate_all, SeedSummary};
pub use syllabus::{parse_topics, InMemorySyllabusPlanner, ParsedTopic, DEFAULT_BOARD};
pub use types::{CacheStats, KnowledgeConfig, KnowledgeStats, NewKnowledge, PlannerStats};
