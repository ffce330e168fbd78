//! Ordered agent registry.
//!
//! Agents are kept in registration order. Selection iterates this order
//! before sorting, which is what makes exact score ties reproducible.

use std::sync::Arc;

use vidya_agents::AgentHandle;
use vidya_common::{AgentCapability, Result, VidyaError};

#[derive(Debug, Default)]
pub struct AgentRegistry {
    handles: Vec<Arc<AgentHandle>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Ids are unique within a registry.
    pub fn register(&mut self, handle: AgentHandle) -> Result<()> {
        if self.contains(handle.id()) {
            return Err(VidyaError::Config(format!(
                "Agent {} is already registered",
                handle.id()
            )));
        }
        self.handles.push(Arc::new(handle));
        Ok(())
    }

    pub fn get(&self, agent_id: &str) -> Option<&Arc<AgentHandle>> {
        self.handles.iter().find(|h| h.id() == agent_id)
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.get(agent_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AgentHandle>> {
        self.handles.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.id()).collect()
    }

    pub fn with_capability(&self, cap: AgentCapability) -> Vec<&Arc<AgentHandle>> {
        self.handles.iter().filter(|h| h.has_capability(cap)).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidya_agents::{AccessibilityAgent, AssessmentAgent, OfflineKnowledgeAgent};

    #[test]
    fn keeps_insertion_order_and_rejects_duplicates() {
        let mut registry = AgentRegistry::new();
        registry
            .register(AgentHandle::from_agent(AssessmentAgent::new()))
            .unwrap();
        registry
            .register(AgentHandle::from_agent(OfflineKnowledgeAgent::new()))
            .unwrap();
        assert_eq!(registry.ids(), vec!["assessment", "offline_knowledge"]);

        let err = registry
            .register(AgentHandle::from_agent(AssessmentAgent::new()))
            .unwrap_err();
        assert!(matches!(err, VidyaError::Config(_)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn capability_lookup() {
        let mut registry = AgentRegistry::new();
        registry
            .register(AgentHandle::from_agent(AccessibilityAgent::new()))
            .unwrap();
        registry
            .register(AgentHandle::from_agent(AssessmentAgent::new()))
            .unwrap();
        let ids: Vec<&str> = registry
            .with_capability(AgentCapability::Accessibility)
            .into_iter()
            .map(|h| h.id())
            .collect();
        assert_eq!(ids, vec!["accessibility"]);
        assert!(registry.get("voice_interface").is_none());
    }
}
