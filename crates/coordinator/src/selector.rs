//! Confidence-scored agent selection.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;
use vidya_agents::AgentHandle;
use vidya_common::QueryContext;

use crate::registry::AgentRegistry;

/// A ranked selection candidate.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub handle: Arc<AgentHandle>,
    pub confidence: f32,
}

impl Candidate {
    pub fn agent_id(&self) -> &str {
        self.handle.id()
    }
}

/// Score every registered agent, keep the positive ones and rank them.
///
/// Higher confidence first; equal confidence goes to the lower priority
/// ordinal; remaining ties keep registry order (the sort is stable).
pub fn select(
    registry: &AgentRegistry,
    query: &str,
    ctx: &QueryContext,
    max_candidates: usize,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = registry
        .iter()
        .filter_map(|handle| {
            let confidence = handle.can_handle(query, ctx);
            debug!(agent = %handle.id(), confidence, "Scored agent");
            (confidence > 0.0).then(|| Candidate {
                handle: Arc::clone(handle),
                confidence,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.handle
                    .priority()
                    .ordinal()
                    .cmp(&b.handle.priority().ordinal())
            })
    });
    candidates.truncate(max_candidates);
    candidates
}
