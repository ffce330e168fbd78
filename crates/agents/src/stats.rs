//! Per-agent request counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vidya_common::AgentMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total_requests: u64,
    pub offline_requests: u64,
    pub online_requests: u64,
    pub successful_responses: u64,
    pub failed_responses: u64,
    /// Mean latency over successful responses only.
    pub avg_response_time_ms: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl AgentStats {
    pub fn record_request(&mut self, at: DateTime<Utc>) {
        self.total_requests += 1;
        self.last_used = Some(at);
    }

    /// Count the path taken. `mode` must already be resolved.
    pub fn record_mode(&mut self, mode: AgentMode) {
        match mode {
            AgentMode::Online => self.online_requests += 1,
            _ => self.offline_requests += 1,
        }
    }

    pub fn record_success(&mut self, elapsed_ms: f64) {
        self.successful_responses += 1;
        let n = self.successful_responses as f64;
        self.avg_response_time_ms = (self.avg_response_time_ms * (n - 1.0) + elapsed_ms) / n;
    }

    pub fn record_failure(&mut self) {
        self.failed_responses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_mean() {
        let mut stats = AgentStats::default();
        for ms in [10.0, 20.0, 60.0] {
            stats.record_success(ms);
        }
        assert_eq!(stats.successful_responses, 3);
        assert!((stats.avg_response_time_ms - 30.0).abs() < 1e-9);
    }

    #[test]
    fn failures_leave_latency_alone() {
        let mut stats = AgentStats::default();
        stats.record_success(8.0);
        stats.record_failure();
        assert_eq!(stats.failed_responses, 1);
        assert!((stats.avg_response_time_ms - 8.0).abs() < 1e-9);
    }

    #[test]
    fn mode_counters() {
        let mut stats = AgentStats::default();
        stats.record_mode(AgentMode::Online);
        stats.record_mode(AgentMode::Offline);
        stats.record_mode(AgentMode::Offline);
        assert_eq!(stats.online_requests, 1);
        assert_eq!(stats.offline_requests, 2);
    }
}
