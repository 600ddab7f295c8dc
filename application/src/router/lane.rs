//! Dispatch lanes: one long-lived task per agent, draining its mailbox in
//! arrival order.

use super::RouterInner;
use crate::error::RouterError;
use crate::ports::model_gateway::GatewayError;
use crate::processor::handlers::{ActionContext, MessagePoster};
use crew_domain::core::string::clip;
use crew_domain::{
    AgentId, AgentMessage, AgentResponse, AgentStatus, ConversationContext, EventPayload,
    ProcessingError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(super) type Reply = oneshot::Sender<Result<AgentResponse, RouterError>>;

pub(super) struct Envelope {
    pub message: AgentMessage,
    pub reply: Option<Reply>,
}

/// State shared between a lane task and the router.
#[derive(Clone)]
pub(super) struct LaneState {
    /// Mirror of the channel contents; the head is the message in flight
    pub mailbox: Arc<Mutex<VecDeque<AgentMessage>>>,
    pub conversation: Arc<Mutex<ConversationContext>>,
}

impl LaneState {
    pub fn new(conversation: ConversationContext) -> Self {
        Self {
            mailbox: Arc::new(Mutex::new(VecDeque::new())),
            conversation: Arc::new(Mutex::new(conversation)),
        }
    }
}

/// Sending half of a lane, held by the router.
#[derive(Clone)]
pub(super) struct Lane {
    pub tx: mpsc::UnboundedSender<Envelope>,
    pub state: LaneState,
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub(super) async fn run(
    router: Weak<RouterInner>,
    agent_id: AgentId,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    state: LaneState,
    token: CancellationToken,
) {
    info!(agent = %agent_id, "Lane started");

    loop {
        let envelope = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            envelope = rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let Some(router) = router.upgrade() else {
            break;
        };
        let result = router.dispatch(&agent_id, &envelope.message, &state).await;
        drop(router);

        lock(&state.mailbox).pop_front();

        match envelope.reply {
            Some(reply) => {
                let _ = reply.send(result);
            }
            None => {
                if let Err(e) = result {
                    debug!(agent = %agent_id, message = %envelope.message.id, error = %e, "Posted message failed");
                }
            }
        }
    }

    lock(&state.mailbox).clear();
    info!(agent = %agent_id, "Lane stopped");
}

/// Refuse work for agents in `Error` or `Offline`.
fn admit(agent_id: &AgentId, status: AgentStatus) -> Result<(), RouterError> {
    match status {
        AgentStatus::Error => Err(RouterError::AgentInErrorState(agent_id.clone())),
        AgentStatus::Offline => Err(RouterError::InvalidTransition {
            from: AgentStatus::Offline,
            to: AgentStatus::Thinking,
        }),
        _ => Ok(()),
    }
}

impl RouterInner {
    /// Admission checks shared by `send_message` and `post`.
    ///
    /// The status is checked again under the registry lock while the message
    /// is pushed, so a concurrent status change cannot let a message into the
    /// mailbox of an agent that has gone `Offline` or into `Error`.
    /// `MessageSent` is published only once the message is queued.
    pub(super) fn enqueue(
        &self,
        agent_id: &AgentId,
        message: AgentMessage,
        reply: Option<Reply>,
    ) -> Result<(), RouterError> {
        let status = self
            .registry
            .status(agent_id)
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))?;
        admit(agent_id, status)?;

        let depth = message.coordination_depth();
        let max = self.config.max_coordination_depth;
        if depth > max {
            return Err(RouterError::CoordinationDepthExceeded { depth, max });
        }

        if self.shutdown.is_cancelled() {
            return Err(RouterError::LaneClosed(agent_id.clone()));
        }
        let lane = lock(&self.lanes)
            .get(agent_id)
            .cloned()
            .ok_or_else(|| RouterError::LaneClosed(agent_id.clone()))?;

        // Channel and mailbox change together so their order never diverges.
        self.registry
            .update(agent_id, |agent| {
                admit(agent_id, agent.status)?;
                let mut mailbox = lock(&lane.state.mailbox);
                lane.tx
                    .send(Envelope {
                        message: message.clone(),
                        reply,
                    })
                    .map_err(|_| RouterError::LaneClosed(agent_id.clone()))?;
                mailbox.push_back(message.clone());
                Ok::<_, RouterError>(())
            })
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))??;

        self.bus.publish(EventPayload::MessageSent {
            agent_id: agent_id.clone(),
            message_id: message.id,
            sender: message.sender,
            message_kind: message.kind,
            content: message.content,
        });
        Ok(())
    }

    /// Handle one message end to end. Runs only on the agent's own lane.
    async fn dispatch(
        &self,
        agent_id: &AgentId,
        message: &AgentMessage,
        state: &LaneState,
    ) -> Result<AgentResponse, RouterError> {
        let agent = self
            .registry
            .get(agent_id)
            .ok_or_else(|| RouterError::AgentNotFound(agent_id.clone()))?;
        if agent.status == AgentStatus::Error {
            return Err(RouterError::AgentInErrorState(agent_id.clone()));
        }
        let persona = self
            .personas
            .get(&agent.agent_type)
            .cloned()
            .ok_or_else(|| {
                RouterError::ConfigurationError(format!("no persona for {}", agent.agent_type))
            })?;

        self.state.attempt_transition(agent_id, AgentStatus::Thinking)?;
        let started = Instant::now();

        let snapshot = lock(&state.conversation).clone();
        let timeout = agent.config.timeout();
        let generated = tokio::time::timeout(
            timeout,
            persona.process_message(
                &agent,
                message,
                &snapshot,
                self.gateway.as_ref(),
                self.memory.as_deref(),
            ),
        )
        .await;

        let raw = match generated {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(self.fail(agent_id, message, e)),
            Err(_) => return Err(self.fail(agent_id, message, GatewayError::Timeout(timeout))),
        };

        let interpretation = self.processor.interpret(&raw, persona.tool_vocabulary());

        {
            let mut conversation = lock(&state.conversation);
            conversation.record_inbound(message);
            conversation.record_reply(agent_id.as_str(), interpretation.content.as_str());
            if message.sender.is_user() && conversation.pending_len() > 0 {
                conversation.clear_pending_questions();
            }
        }

        let mut response = AgentResponse::new(
            message.id.clone(),
            agent_id.clone(),
            agent.agent_type,
            clip(&interpretation.content, agent.config.max_response_length),
        );
        response.errors = interpretation.errors;

        let mut executed = 0;
        if !interpretation.actions.is_empty() {
            self.state.attempt_transition(agent_id, AgentStatus::Working)?;

            let Some(poster) = self.self_ref.upgrade() else {
                return Err(RouterError::LaneClosed(agent_id.clone()));
            };
            let ctx = ActionContext {
                agent: self.registry.get(agent_id).unwrap_or_else(|| agent.clone()),
                message: message.clone(),
                conversation: state.conversation.clone(),
                poster: poster as Arc<dyn MessagePoster>,
                bus: self.bus.clone(),
                memory: self.memory.clone(),
                plans: self.plans.clone(),
            };
            let report = self.processor.execute(&interpretation.actions, &ctx).await;
            executed = report.executed_count();
            response.outcomes = report.outcomes;
            response.errors.extend(report.errors);
            response.actions = interpretation.actions.into_iter().map(|(_, a)| a).collect();
        }

        let next = match interpretation.status_update {
            None => AgentStatus::Idle,
            Some(s @ (AgentStatus::Idle | AgentStatus::Waiting)) => s,
            Some(other) => {
                response.errors.push(ProcessingError::status_update(format!(
                    "agents may only request idle or waiting, not {other}"
                )));
                AgentStatus::Idle
            }
        };
        response.status_update = interpretation.status_update;

        if let Err(e) = self.state.attempt_transition(agent_id, next) {
            response.errors.push(ProcessingError::status_update(e.to_string()));
            if next != AgentStatus::Idle {
                self.state.attempt_transition(agent_id, AgentStatus::Idle)?;
            }
        }

        let elapsed = started.elapsed();
        self.registry.update(agent_id, |a| {
            a.stats.record_response(elapsed, executed as u64);
        });
        let response = response.with_duration(elapsed);

        self.bus.publish(EventPayload::ResponseReceived {
            agent_id: agent_id.clone(),
            message_id: message.id.clone(),
            content: response.content.clone(),
            action_count: response.actions.len(),
            error_count: response.errors.len(),
            duration_ms: response.duration_ms,
        });
        debug!(
            agent = %agent_id,
            actions = response.actions.len(),
            errors = response.errors.len(),
            elapsed_ms = response.duration_ms,
            "Message handled"
        );
        Ok(response)
    }

    /// Record a provider failure and move the agent into `Error`.
    fn fail(&self, agent_id: &AgentId, message: &AgentMessage, error: GatewayError) -> RouterError {
        self.registry.update(agent_id, |a| a.stats.record_error());
        if let Err(e) = self.state.attempt_transition(agent_id, AgentStatus::Error) {
            warn!(agent = %agent_id, error = %e, "Could not enter error state");
        }
        warn!(agent = %agent_id, message = %message.id, error = %error, "Provider call failed");
        self.bus.publish(EventPayload::Error {
            agent_id: Some(agent_id.clone()),
            message_id: Some(message.id.clone()),
            error: error.to_string(),
        });
        RouterError::ProviderError(error)
    }
}

impl MessagePoster for RouterInner {
    fn resolve(&self, target: &str) -> Option<AgentId> {
        self.registry.resolve(target)
    }

    fn post(&self, agent_id: &AgentId, message: AgentMessage) -> Result<(), RouterError> {
        self.enqueue(agent_id, message, None)
    }
}
