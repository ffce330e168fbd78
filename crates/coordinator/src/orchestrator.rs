//! The dispatcher: selection, primary execution, enhancement and telemetry.
//!
//! ```text
//! process_query
//!      │
//!      ▼
//!   select ──(nothing confident)──► fallback agent ──► is_fallback
//!      │
//!      ▼
//!   primary.process()
//!      │ success && secondaries
//!      ▼
//!   enhance (Flag: attach true, Invoke: run concurrently)
//!      │
//!      ▼
//!   stats + total_response_time_ms
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use vidya_agents::{AgentHandle, AgentInfo};
use vidya_common::{
    AgentCapability, AgentMode, AgentPriority, Enhancement, Envelope, QueryContext, Result,
    VidyaError,
};

use crate::catalog::{build_registry, Collaborators};
use crate::config::OrchestratorConfig;
use crate::registry::AgentRegistry;
use crate::selector::{select, Candidate};
use crate::stats::{AgentUsage, OrchestratorStats, StatsReport};

const GENERIC_FAILURE: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Health view returned by [`Orchestrator::health_check`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub orchestrator: String,
    pub agents: BTreeMap<String, String>,
    pub tools: BTreeMap<String, String>,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: AgentRegistry,
    collaborators: Collaborators,
    stats: Mutex<OrchestratorStats>,
    running: AtomicBool,
}

impl Orchestrator {
    /// Build the standard agent set over the given collaborators.
    ///
    /// A remote AI client is created from `config.llm` unless one was
    /// supplied; a speech key is resolved from config or environment.
    pub fn init(config: OrchestratorConfig, collaborators: Collaborators) -> Result<Self> {
        let collaborators = collaborators.resolve_remote(&config);
        let registry = build_registry(&config, &collaborators)?;
        Self::with_registry(config, registry, collaborators)
    }

    /// Orchestrate an arbitrary agent set.
    pub fn with_registry(
        config: OrchestratorConfig,
        registry: AgentRegistry,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let Some(fallback) = registry.get(&config.fallback_agent) else {
            return Err(VidyaError::Config(format!(
                "Fallback agent {} is not registered",
                config.fallback_agent
            )));
        };
        let profile = fallback.profile();
        if profile.priority != AgentPriority::Critical || profile.default_mode != AgentMode::Offline
        {
            return Err(VidyaError::Config(format!(
                "Fallback agent {} must be critical and offline by default (got {:?}, {:?})",
                config.fallback_agent, profile.priority, profile.default_mode
            )));
        }
        if let Some(mode) = config.default_mode {
            for handle in registry.iter() {
                handle.set_mode(mode);
            }
        }

        info!(
            agents = registry.len(),
            fallback = %config.fallback_agent,
            tools = ?collaborators,
            "Orchestrator initialized"
        );

        Ok(Self {
            config,
            registry,
            collaborators,
            stats: Mutex::new(OrchestratorStats::default()),
            running: AtomicBool::new(true),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting queries. Idempotent.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let stats = self.stats.lock();
            info!(
                total_queries = stats.total_queries,
                successful = stats.successful_queries,
                "Orchestrator shut down"
            );
        }
    }

    /// Answer a query. Always returns an envelope; never panics or errors.
    pub async fn process_query(&self, query: &str, ctx: &QueryContext) -> Envelope {
        if !self.is_running() {
            return Envelope::failure("The assistant is not running.")
                .with_error("Orchestrator has been shut down");
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.dispatch(query, ctx))
            .catch_unwind()
            .await;

        let mut envelope = match outcome {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(e)) => {
                error!(error = %e, "Query processing failed");
                self.generic_failure()
            }
            Err(payload) => {
                error!(panic = %panic_message(&payload), "Query processing panicked");
                self.generic_failure()
            }
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        envelope.total_response_time_ms = Some(round_ms(elapsed_ms));
        envelope
    }

    fn generic_failure(&self) -> Envelope {
        self.stats.lock().record(None, false);
        Envelope::failure(GENERIC_FAILURE).with_error("internal_error")
    }

    async fn dispatch(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let candidates = self.select(query, ctx);

        let Some(primary) = candidates.first() else {
            return self.run_fallback(query, ctx).await;
        };

        info!(
            agent = %primary.agent_id(),
            confidence = primary.confidence,
            candidates = candidates.len(),
            "Selected primary agent"
        );

        let mut envelope = primary.handle.process(query, ctx, None).await;
        if envelope.success && candidates.len() > 1 {
            self.enhance(&mut envelope, &candidates[1..], query, ctx).await;
        }

        self.stats
            .lock()
            .record(Some(primary.agent_id()), envelope.success);
        Ok(envelope)
    }

    async fn run_fallback(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let fallback_id = &self.config.fallback_agent;
        let handle = self
            .registry
            .get(fallback_id)
            .ok_or_else(|| VidyaError::UnknownAgent(fallback_id.clone()))?;

        info!(agent = %fallback_id, "No confident agent, using fallback");
        let mut envelope = handle.process(query, ctx, Some(AgentMode::Offline)).await;
        envelope.is_fallback = true;
        self.stats.lock().record(Some(fallback_id), envelope.success);
        Ok(envelope)
    }

    /// Attach secondary-agent contributions to a successful primary response.
    ///
    /// Secondary failures are logged and omitted; existing keys are kept.
    async fn enhance(
        &self,
        envelope: &mut Envelope,
        secondaries: &[Candidate],
        query: &str,
        ctx: &QueryContext,
    ) {
        let threshold = self.config.selection.enhancement_threshold;
        let eligible: Vec<&Candidate> = secondaries
            .iter()
            .take(self.config.selection.max_enhancements)
            .filter(|c| c.confidence > threshold)
            .collect();
        if eligible.is_empty() {
            return;
        }

        let mut sub_ctx = ctx.clone();
        if let Some(subject) = envelope.get_str("subject") {
            sub_ctx.subject = Some(subject.to_string());
        }

        let invoked: Vec<&Candidate> = eligible
            .iter()
            .copied()
            .filter(|c| matches!(c.handle.enhancement(), Enhancement::Invoke { .. }))
            .collect();
        let results = join_all(
            invoked
                .iter()
                .map(|c| c.handle.process(query, &sub_ctx, None)),
        )
        .await;
        let mut results = results.into_iter();

        for candidate in eligible {
            match candidate.handle.enhancement() {
                Enhancement::None => {}
                Enhancement::Flag { key } => {
                    envelope.add_enhancement(key, Value::Bool(true));
                }
                Enhancement::Invoke { key } => {
                    let Some(contribution) = results.next() else {
                        continue;
                    };
                    if !contribution.success {
                        warn!(
                            agent = %candidate.agent_id(),
                            error = contribution.error.as_deref().unwrap_or("unsuccessful"),
                            "Enhancement skipped"
                        );
                        continue;
                    }
                    if envelope.add_enhancement(key, contribution.to_value()) {
                        debug!(agent = %candidate.agent_id(), key, "Enhancement attached");
                    }
                }
            }
        }
    }

    /// Ranked candidates as `(agent_id, confidence)`.
    pub fn select_agents(&self, query: &str, ctx: &QueryContext) -> Vec<(String, f32)> {
        self.select(query, ctx)
            .into_iter()
            .map(|c| (c.agent_id().to_string(), c.confidence))
            .collect()
    }

    fn select(&self, query: &str, ctx: &QueryContext) -> Vec<Candidate> {
        select(
            &self.registry,
            query,
            ctx,
            self.config.selection.max_candidates,
        )
    }

    pub fn list_agents(&self) -> Vec<AgentInfo> {
        self.registry.iter().map(|h| h.info()).collect()
    }

    pub fn get_agent(&self, agent_id: &str) -> Result<AgentInfo> {
        self.registry
            .get(agent_id)
            .map(|h| h.info())
            .ok_or_else(|| VidyaError::UnknownAgent(agent_id.to_string()))
    }

    pub fn get_agents_by_capability(&self, cap: AgentCapability) -> Vec<AgentInfo> {
        self.registry
            .with_capability(cap)
            .into_iter()
            .map(|h| h.info())
            .collect()
    }

    /// Set the mode of the named agents, or of every agent when `agent_ids`
    /// is `None`. Returns how many agents were updated.
    pub fn set_mode(&self, mode: AgentMode, agent_ids: Option<&[String]>) -> usize {
        let targets: Vec<&AgentHandle> = match agent_ids {
            None => self.registry.iter().map(|h| h.as_ref()).collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| match self.registry.get(id) {
                    Some(handle) => Some(handle.as_ref()),
                    None => {
                        warn!(agent = %id, "Cannot set mode of unknown agent");
                        None
                    }
                })
                .collect(),
        };
        for handle in &targets {
            handle.set_mode(mode);
        }
        info!(mode = %mode, updated = targets.len(), "Agent modes updated");
        targets.len()
    }

    pub fn get_stats(&self) -> StatsReport {
        let stats = self.stats.lock();
        StatsReport {
            total_queries: stats.total_queries,
            successful_queries: stats.successful_queries,
            failed_queries: stats.failed_queries,
            success_rate: stats.success_rate(),
            total_agents: self.registry.len(),
            agent_usage: self
                .registry
                .iter()
                .map(|h| AgentUsage {
                    id: h.id().to_string(),
                    name: h.name().to_string(),
                    usage_count: stats.usage_count(h.id()),
                })
                .collect(),
        }
    }

    /// Clear orchestrator counters and every agent's stats.
    pub fn reset_stats(&self) {
        *self.stats.lock() = OrchestratorStats::default();
        for handle in self.registry.iter() {
            handle.reset_stats();
        }
        info!("Statistics reset");
    }

    pub fn health_check(&self) -> HealthReport {
        let agents = self
            .registry
            .iter()
            .map(|handle| {
                let status = match std::panic::catch_unwind(AssertUnwindSafe(|| handle.info())) {
                    Ok(_) => "healthy".to_string(),
                    Err(payload) => format!("unhealthy: {}", panic_message(&payload)),
                };
                (handle.id().to_string(), status)
            })
            .collect();

        let tools = self
            .collaborators
            .availability()
            .into_iter()
            .map(|(name, present)| {
                let status = if present { "available" } else { "not_initialized" };
                (name.to_string(), status.to_string())
            })
            .collect();

        HealthReport {
            orchestrator: (if self.is_running() { "healthy" } else { "shut_down" }).to_string(),
            agents,
            tools,
        }
    }
}

fn round_ms(ms: f64) -> f64 {
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
