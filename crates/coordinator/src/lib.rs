//! Agent orchestration for vidya.
//!
//! The orchestrator is the single entry point callers use:
//! 1. Scores every registered agent against the query and context
//! 2. Runs the most confident one (or the fallback agent when none is)
//! 3. Lets up to two runners-up enhance a successful answer
//! 4. Keeps usage and success counters for monitoring
//!
//! # Architecture
//!
//! ```text
//! process_query(query, ctx)
//!      │
//!      ▼
//! ┌──────────────────┐
//! │   Orchestrator   │  ◄── selector (score, priority, registry order)
//! │   (this crate)   │
//! └────────┬─────────┘
//!          │ AgentHandle::process
//!    ┌─────┴──────┬───────────┬─────────────┐
//!    ▼            ▼           ▼             ▼
//! [Offline]   [Study]    [Assessment]   [Content]  ...
//! Knowledge   Assistant                 Discovery
//! ```

pub mod catalog;
pub mod config;
pub mod orchestrator;
pub mod registry;
pub mod selector;
pub mod stats;

pub use catalog::{build_registry, Collaborators};
pub use config::{OrchestratorConfig, SelectionConfig, SpeechConfig};
pub use orchestrator::{HealthReport, Orchestrator};
pub use registry::AgentRegistry;
pub use selector::Candidate;
pub use stats::{AgentUsage, OrchestratorStats, StatsReport};
