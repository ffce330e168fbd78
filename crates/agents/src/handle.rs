//! Runtime wrapper around an [`Agent`]: current mode, stats and the guarded
//! `process()` pipeline.
//!
//! Agents themselves are stateless with respect to bookkeeping. Everything
//! the coordinator observes about an agent (mode, counters, latency) lives
//! here, so a misbehaving agent can return an error, hang or panic without
//! taking the caller down with it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Enhancement, Envelope,
    QueryContext, VidyaError,
};

use crate::stats::AgentStats;

pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

const FAILURE_MESSAGE: &str = "This request could not be completed.";

/// Serializable snapshot of an agent handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<AgentCapability>,
    /// Priority ordinal, 1 (critical) to 4 (low).
    pub priority: u8,
    pub current_mode: AgentMode,
    pub stats: AgentStats,
}

pub struct AgentHandle {
    agent: Arc<dyn Agent>,
    mode: RwLock<AgentMode>,
    stats: Mutex<AgentStats>,
    timeout: Duration,
}

impl AgentHandle {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        let mode = agent.profile().default_mode;
        Self {
            agent,
            mode: RwLock::new(mode),
            stats: Mutex::new(AgentStats::default()),
            timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn from_agent(agent: impl Agent + 'static) -> Self {
        Self::new(Arc::new(agent))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub fn profile(&self) -> &AgentProfile {
        self.agent.profile()
    }

    pub fn id(&self) -> &str {
        self.agent.id()
    }

    pub fn name(&self) -> &str {
        self.agent.name()
    }

    pub fn priority(&self) -> AgentPriority {
        self.profile().priority
    }

    pub fn has_capability(&self, cap: AgentCapability) -> bool {
        self.agent.has_capability(cap)
    }

    pub fn enhancement(&self) -> Enhancement {
        self.agent.enhancement()
    }

    /// The agent's confidence, forced into [0, 1]. NaN counts as 0.
    pub fn can_handle(&self, query: &str, ctx: &QueryContext) -> f32 {
        let score = self.agent.can_handle(query, ctx);
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    pub fn mode(&self) -> AgentMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: AgentMode) {
        *self.mode.write() = mode;
        info!(agent = %self.id(), mode = %mode, "Agent mode changed");
    }

    pub fn stats(&self) -> AgentStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = AgentStats::default();
    }

    pub fn info(&self) -> AgentInfo {
        let profile = self.profile();
        AgentInfo {
            agent_id: profile.id.clone(),
            name: profile.name.clone(),
            description: profile.description.clone(),
            capabilities: profile.capabilities.clone(),
            priority: profile.priority.ordinal(),
            current_mode: self.mode(),
            stats: self.stats(),
        }
    }

    /// Run the agent once. Never fails: errors, timeouts and panics come
    /// back as `success: false` envelopes.
    ///
    /// An explicit `mode_override` wins over the current mode; `Auto` is
    /// resolved from the context either way.
    pub async fn process(
        &self,
        query: &str,
        ctx: &QueryContext,
        mode_override: Option<AgentMode>,
    ) -> Envelope {
        let started = Instant::now();
        let mode = mode_override.unwrap_or_else(|| self.mode()).resolve(ctx);
        {
            let mut stats = self.stats.lock();
            stats.record_request(Utc::now());
            stats.record_mode(mode);
        }

        debug!(agent = %self.id(), mode = %mode, "Processing query");

        let agent = Arc::clone(&self.agent);
        let path = async move {
            match mode {
                AgentMode::Online => agent.process_online(query, ctx).await,
                _ => agent.process_offline(query, ctx).await,
            }
        };

        let outcome = match tokio::time::timeout(self.timeout, AssertUnwindSafe(path).catch_unwind())
            .await
        {
            Ok(Ok(Ok(envelope))) => Ok(envelope),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(payload)) => Err(format!("Agent panicked: {}", panic_message(&payload))),
            Err(_) => Err(VidyaError::Timeout(self.timeout.as_millis() as u64).to_string()),
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(mut envelope) => {
                self.stats.lock().record_success(elapsed_ms);
                self.stamp(&mut envelope, mode);
                envelope.response_time_ms = Some(round_ms(elapsed_ms));
                envelope
            }
            Err(reason) => {
                self.stats.lock().record_failure();
                warn!(agent = %self.id(), mode = %mode, error = %reason, "Agent processing failed");
                let mut envelope = Envelope::failure(FAILURE_MESSAGE).with_error(reason);
                self.stamp(&mut envelope, mode);
                envelope
            }
        }
    }

    fn stamp(&self, envelope: &mut Envelope, mode: AgentMode) {
        envelope.agent_id = Some(self.id().to_string());
        envelope.agent_name = Some(self.name().to_string());
        envelope.mode = Some(mode);
        envelope.timestamp = Some(Utc::now());
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id())
            .field("mode", &self.mode())
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub(crate) fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
