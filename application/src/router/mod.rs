//! Agent router: owns the crew and delivers messages to it.
//!
//! Every agent gets a mailbox and a dispatch lane: a tokio task that takes
//! one message at a time off the mailbox, runs the agent's persona against
//! the model gateway, interprets the reply and executes the resulting
//! actions. Lanes of different agents run concurrently; a single agent
//! never has more than one message in flight.
//!
//! Coordination between agents goes through [`MessagePoster::post`], which
//! enqueues without waiting, so an agent that delegates work never blocks
//! on the agent it delegated to.
//!
//! [`MessagePoster::post`]: crate::processor::handlers::MessagePoster::post

mod lane;

use crate::bus::{EventBus, EventFilter, Subscription};
use crate::config::CrewConfig;
use crate::error::RouterError;
use crate::persona::{PersonaStrategy, persona_for};
use crate::ports::confirmation::{AutoDeclineConfirmation, ConfirmationPort};
use crate::ports::memory::MemoryPort;
use crate::ports::model_gateway::ModelGateway;
use crate::processor::ResponseProcessor;
use crate::processor::plan_board::PlanBoard;
use crate::registry::AgentRegistry;
use crate::state_machine::StatusStateMachine;
use crew_domain::{
    Agent, AgentId, AgentMessage, AgentResponse, AgentStatus, AgentType, ConversationContext,
    DomainEvent, EventPayload,
};
use lane::{Lane, LaneState, lock};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct RouterInner {
    registry: Arc<AgentRegistry>,
    state: StatusStateMachine,
    bus: EventBus,
    gateway: Arc<dyn ModelGateway>,
    memory: Option<Arc<dyn MemoryPort>>,
    processor: ResponseProcessor,
    personas: HashMap<AgentType, Arc<dyn PersonaStrategy>>,
    plans: PlanBoard,
    config: CrewConfig,
    lanes: Mutex<HashMap<AgentId, Lane>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
    self_ref: Weak<RouterInner>,
}

impl RouterInner {
    fn spawn_agent(
        &self,
        agent_type: AgentType,
        name: Option<String>,
    ) -> Result<AgentId, RouterError> {
        if self.shutdown.is_cancelled() {
            return Err(RouterError::LaneClosed(agent_type.default_id()));
        }

        let config = self.config.agent_config(agent_type);
        config.validate()?;

        // Held across the capacity check and the insert.
        let mut lanes = lock(&self.lanes);
        let max = self.config.max_agents;
        if self.registry.len() >= max {
            return Err(RouterError::RegistryFull { max });
        }

        let id = self.registry.next_id(agent_type);
        let name = name.unwrap_or_else(|| {
            if id == agent_type.default_id() {
                agent_type.display_name().to_string()
            } else {
                format!("{} ({id})", agent_type.display_name())
            }
        });
        let agent = Agent::new(id.clone(), agent_type, name.clone(), config);
        // `next_id` skips taken ids and the lanes lock is still held.
        let inserted = self.registry.insert(agent);
        debug_assert!(inserted, "agent id {id} already taken");

        let (tx, rx) = mpsc::unbounded_channel();
        let state = LaneState::new(ConversationContext::new(self.config.windows));
        let task = tokio::spawn(lane::run(
            self.self_ref.clone(),
            id.clone(),
            rx,
            state.clone(),
            self.shutdown.clone(),
        ));
        lanes.insert(id.clone(), Lane { tx, state });
        lock(&self.tasks).push(task);
        drop(lanes);

        info!(agent = %id, %agent_type, "Agent spawned");
        self.bus.publish(EventPayload::AgentCreated {
            agent_id: id.clone(),
            agent_type,
            name,
        });
        Ok(id)
    }
}

/// Builder for [`AgentRouter`].
pub struct AgentRouterBuilder {
    gateway: Arc<dyn ModelGateway>,
    config: CrewConfig,
    bus: Option<EventBus>,
    memory: Option<Arc<dyn MemoryPort>>,
    confirmation: Arc<dyn ConfirmationPort>,
    processor: Option<ResponseProcessor>,
    personas: HashMap<AgentType, Arc<dyn PersonaStrategy>>,
    default_team: bool,
}

impl AgentRouterBuilder {
    pub fn config(mut self, config: CrewConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish on an existing bus instead of a fresh one.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryPort>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Gate for actions that require confirmation. Ignored when a full
    /// processor is supplied.
    pub fn confirmation(mut self, confirmation: Arc<dyn ConfirmationPort>) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn processor(mut self, processor: ResponseProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Override the persona strategy for one role.
    pub fn persona(mut self, persona: Arc<dyn PersonaStrategy>) -> Self {
        self.personas.insert(persona.agent_type(), persona);
        self
    }

    /// Start with an empty registry instead of one agent per role.
    pub fn without_default_team(mut self) -> Self {
        self.default_team = false;
        self
    }

    /// Validate the configuration, spawn the lanes and register the default
    /// team. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<AgentRouter, RouterError> {
        self.config.validate()?;

        let registry = Arc::new(AgentRegistry::new());
        let bus = self.bus.unwrap_or_default();
        let processor = self
            .processor
            .unwrap_or_else(|| ResponseProcessor::new(self.confirmation));

        let inner = Arc::new_cyclic(|self_ref| RouterInner {
            state: StatusStateMachine::new(registry.clone(), bus.clone()),
            registry,
            bus,
            gateway: self.gateway,
            memory: self.memory,
            processor,
            personas: self.personas,
            plans: PlanBoard::new(),
            config: self.config,
            lanes: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
            self_ref: self_ref.clone(),
        });

        if self.default_team {
            for agent_type in AgentType::ALL {
                inner.spawn_agent(agent_type, None)?;
            }
        }
        info!(agents = inner.registry.len(), "Router ready");
        Ok(AgentRouter { inner })
    }
}

/// Handle to the crew. Cheap to clone; all clones share the same agents.
#[derive(Clone)]
pub struct AgentRouter {
    inner: Arc<RouterInner>,
}

impl AgentRouter {
    pub fn builder(gateway: Arc<dyn ModelGateway>) -> AgentRouterBuilder {
        AgentRouterBuilder {
            gateway,
            config: CrewConfig::default(),
            bus: None,
            memory: None,
            confirmation: Arc::new(AutoDeclineConfirmation),
            processor: None,
            personas: AgentType::ALL
                .into_iter()
                .map(|t| (t, persona_for(t)))
                .collect(),
            default_team: true,
        }
    }

    /// Deliver `message` to `agent_id` and wait for the agent's response.
    ///
    /// Admission errors (unknown agent, agent in `Error` or `Offline`,
    /// coordination depth) return immediately without touching the mailbox.
    pub async fn send_message(
        &self,
        agent_id: &AgentId,
        message: AgentMessage,
    ) -> Result<AgentResponse, RouterError> {
        let (tx, rx) = oneshot::channel();
        self.inner.enqueue(agent_id, message, Some(tx))?;
        rx.await
            .map_err(|_| RouterError::LaneClosed(agent_id.clone()))?
    }

    /// Enqueue `message` without waiting for the response.
    pub fn post(&self, agent_id: &AgentId, message: AgentMessage) -> Result<(), RouterError> {
        self.inner.enqueue(agent_id, message, None)
    }

    pub fn get_status(&self, agent_id: &AgentId) -> Result<AgentStatus, RouterError> {
        self.inner
            .registry
            .status(agent_id)
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))
    }

    pub fn get_all_statuses(&self) -> BTreeMap<AgentId, AgentStatus> {
        self.inner.registry.statuses()
    }

    /// Messages accepted but not yet answered, oldest first. The head is the
    /// one being processed, if any.
    pub fn get_message_queue(&self, agent_id: &AgentId) -> Result<Vec<AgentMessage>, RouterError> {
        if !self.inner.registry.contains(agent_id) {
            return Err(RouterError::AgentNotFound(agent_id.clone()));
        }
        let lanes = lock(&self.inner.lanes);
        Ok(lanes
            .get(agent_id)
            .map(|lane| lock(&lane.state.mailbox).iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn get_agent(&self, agent_id: &AgentId) -> Result<Agent, RouterError> {
        self.inner
            .registry
            .get(agent_id)
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))
    }

    /// All agents in registration order.
    pub fn list_agents(&self) -> Vec<Agent> {
        self.inner.registry.list()
    }

    /// Resolve an agent id or role name.
    pub fn resolve(&self, target: &str) -> Option<AgentId> {
        self.inner.registry.resolve(target)
    }

    pub fn subscribe(
        &self,
        filter: impl Into<EventFilter>,
        handler: impl Fn(&DomainEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.bus.subscribe(filter, handler)
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn plans(&self) -> &PlanBoard {
        &self.inner.plans
    }

    pub fn config(&self) -> &CrewConfig {
        &self.inner.config
    }

    /// Move an agent to `to` through the status state machine.
    pub fn attempt_transition(
        &self,
        agent_id: &AgentId,
        to: AgentStatus,
    ) -> Result<AgentStatus, RouterError> {
        self.inner.state.attempt_transition(agent_id, to)
    }

    /// Bring an agent in `Error` or `Offline` back to `Idle`.
    pub fn recover(&self, agent_id: &AgentId) -> Result<(), RouterError> {
        let status = self.get_status(agent_id)?;
        match status {
            AgentStatus::Idle => Ok(()),
            AgentStatus::Error | AgentStatus::Offline => {
                self.inner.state.attempt_transition(agent_id, AgentStatus::Idle)?;
                info!(agent = %agent_id, from = %status, "Agent recovered");
                Ok(())
            }
            busy => Err(RouterError::InvalidTransition {
                from: busy,
                to: AgentStatus::Idle,
            }),
        }
    }

    /// Take an idle agent offline. Offline agents reject new messages.
    pub fn take_offline(&self, agent_id: &AgentId) -> Result<(), RouterError> {
        self.inner
            .state
            .attempt_transition(agent_id, AgentStatus::Offline)?;
        Ok(())
    }

    /// Register another agent of `agent_type` with its own lane.
    pub fn spawn_agent(
        &self,
        agent_type: AgentType,
        name: Option<String>,
    ) -> Result<AgentId, RouterError> {
        self.inner.spawn_agent(agent_type, name)
    }

    /// Stop every lane. Messages still queued are answered with `LaneClosed`.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        lock(&self.inner.lanes).clear();
        let tasks: Vec<_> = std::mem::take(&mut *lock(&self.inner.tasks));

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "Lane task ended abnormally");
            }
        }
        info!("Router shut down");
    }
}

impl std::fmt::Debug for AgentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRouter")
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests;
