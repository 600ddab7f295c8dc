//! Status state machine: the only path by which an agent's status changes.

use crate::bus::EventBus;
use crate::error::RouterError;
use crate::registry::AgentRegistry;
use crew_domain::{AgentId, AgentStatus, EventPayload};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StatusStateMachine {
    registry: Arc<AgentRegistry>,
    bus: EventBus,
}

impl StatusStateMachine {
    pub fn new(registry: Arc<AgentRegistry>, bus: EventBus) -> Self {
        Self { registry, bus }
    }

    /// Move `agent_id` to `to`, returning the previous status.
    ///
    /// Moving to the current status succeeds without publishing anything.
    /// An unreachable target fails with `InvalidTransition` and leaves the
    /// status untouched. A real change is applied under the registry lock and
    /// followed by exactly one `StatusChanged` event.
    pub fn attempt_transition(
        &self,
        agent_id: &AgentId,
        to: AgentStatus,
    ) -> Result<AgentStatus, RouterError> {
        let from = self
            .registry
            .update(agent_id, |agent| {
                let from = agent.status;
                from.validate_transition(to)?;
                if from != to {
                    agent.status = to;
                    agent.touch();
                }
                Ok::<_, crew_domain::DomainError>(from)
            })
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))??;

        if from != to {
            debug!(agent = %agent_id, %from, %to, "Status changed");
            self.bus.publish(EventPayload::StatusChanged {
                agent_id: agent_id.clone(),
                from,
                to,
            });
        }
        Ok(from)
    }
}
