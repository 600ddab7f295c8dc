//! Agent registry: the single owner of every agent record.
//!
//! Reads hand out clones. Mutation is crate-private so that only the router
//! and the status state machine can change an agent.

use crew_domain::{Agent, AgentId, AgentStatus, AgentType};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct RegistryInner {
    agents: HashMap<AgentId, Agent>,
    /// Registration order, for stable listings
    order: Vec<AgentId>,
}

#[derive(Default)]
pub struct AgentRegistry {
    inner: RwLock<RegistryInner>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Returns `false` if the id is taken.
    pub(crate) fn insert(&self, agent: Agent) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.agents.contains_key(&agent.id) {
            return false;
        }
        inner.order.push(agent.id.clone());
        inner.agents.insert(agent.id.clone(), agent);
        true
    }

    /// Apply `f` to the agent under the write lock.
    pub(crate) fn update<R>(&self, id: &AgentId, f: impl FnOnce(&mut Agent) -> R) -> Option<R> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.agents.get_mut(id).map(f)
    }

    pub fn get(&self, id: &AgentId) -> Option<Agent> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.agents.get(id).cloned()
    }

    pub fn status(&self, id: &AgentId) -> Option<AgentStatus> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.agents.get(id).map(|a| a.status)
    }

    pub fn statuses(&self) -> BTreeMap<AgentId, AgentStatus> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .agents
            .iter()
            .map(|(id, agent)| (id.clone(), agent.status))
            .collect()
    }

    /// All agents in registration order.
    pub fn list(&self) -> Vec<Agent> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id).cloned())
            .collect()
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First registered agent of the given type.
    pub fn first_of_type(&self, agent_type: AgentType) -> Option<AgentId> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .order
            .iter()
            .find(|id| inner.agents.get(*id).is_some_and(|a| a.agent_type == agent_type))
            .cloned()
    }

    /// Resolve an agent id, or a role name meaning the first agent of that role.
    pub fn resolve(&self, target: &str) -> Option<AgentId> {
        let id = AgentId::new(target.trim());
        if self.contains(&id) {
            return Some(id);
        }
        target
            .parse::<AgentType>()
            .ok()
            .and_then(|t| self.first_of_type(t))
    }

    /// An unused id for a new agent of `agent_type` (`engineer`, `engineer-2`, ...).
    pub fn next_id(&self, agent_type: AgentType) -> AgentId {
        let base = agent_type.default_id();
        if !self.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| AgentId::new(format!("{}-{n}", agent_type.as_str())))
            .find(|id| !self.contains(id))
            .unwrap_or(base)
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.len())
            .finish()
    }
}
