//! Orchestrator-wide counters.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct OrchestratorStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    usage: HashMap<String, u64>,
}

impl OrchestratorStats {
    /// Record one top-level query, attributed to the agent that answered it.
    pub fn record(&mut self, agent_id: Option<&str>, success: bool) {
        self.total_queries += 1;
        if success {
            self.successful_queries += 1;
        } else {
            self.failed_queries += 1;
        }
        if let Some(id) = agent_id {
            *self.usage.entry(id.to_string()).or_default() += 1;
        }
    }

    pub fn usage_count(&self, agent_id: &str) -> u64 {
        self.usage.get(agent_id).copied().unwrap_or(0)
    }

    /// Percentage of successful queries; 0 before the first query.
    pub fn success_rate(&self) -> f64 {
        if self.total_queries == 0 {
            return 0.0;
        }
        self.successful_queries as f64 / self.total_queries as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentUsage {
    pub id: String,
    pub name: String,
    pub usage_count: u64,
}

/// Snapshot returned by `Orchestrator::get_stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub success_rate: f64,
    pub total_agents: usize,
    pub agent_usage: Vec<AgentUsage>,
}
