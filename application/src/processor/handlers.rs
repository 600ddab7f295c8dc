//! Action handlers: one per action kind.
//!
//! Handlers run inside the dispatch lane of the agent that produced the
//! action. They may publish events, write memory, touch the agent's own
//! conversation context, and post messages to other agents through
//! [`MessagePoster`]. They never change any agent's status.

use super::plan_board::{PlanBoard, PlanRecord};
use crate::bus::EventBus;
use crate::error::{ActionExecutionError, RouterError};
use crate::ports::memory::{MemoryEntry, MemoryKind, MemoryPort};
use async_trait::async_trait;
use crew_domain::{
    ActionKind, ActionPayload, Agent, AgentAction, AgentId, AgentMessage, COORDINATED_BY_KEY,
    ConversationContext, EventPayload, MessageKind, PendingQuestion, Priority,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Re-entry point into the router for coordination.
pub trait MessagePoster: Send + Sync {
    /// Resolve an agent id, or a role name meaning the first agent of that role.
    fn resolve(&self, target: &str) -> Option<AgentId>;

    /// Enqueue without waiting for the response.
    fn post(&self, agent_id: &AgentId, message: AgentMessage) -> Result<(), RouterError>;
}

/// Everything a handler may use while executing one action.
pub struct ActionContext {
    /// Snapshot of the acting agent
    pub agent: Agent,
    /// The inbound message being answered
    pub message: AgentMessage,
    pub conversation: Arc<Mutex<ConversationContext>>,
    pub poster: Arc<dyn MessagePoster>,
    pub bus: EventBus,
    pub memory: Option<Arc<dyn MemoryPort>>,
    pub plans: PlanBoard,
}

impl ActionContext {
    /// Store to memory if configured; failures are logged and ignored.
    pub async fn remember(&self, kind: MemoryKind, content: String) {
        if let Some(memory) = &self.memory
            && let Err(e) = memory
                .store(MemoryEntry::new(self.agent.id.clone(), kind, content))
                .await
        {
            warn!(agent = %self.agent.id, error = %e, "Memory store failed");
        }
    }

    /// Send `request` to `target` as a coordination message one hop deeper
    /// than the message being answered.
    pub fn coordinate(
        &self,
        target: &str,
        request: &str,
        kind: MessageKind,
    ) -> Result<AgentId, ActionExecutionError> {
        let target_id = self
            .poster
            .resolve(target)
            .ok_or_else(|| ActionExecutionError::UnknownTarget(target.to_string()))?;
        if target_id == self.agent.id {
            return Err(ActionExecutionError::SelfCoordination);
        }

        let depth = self.message.coordination_depth() + 1;
        let mut message = AgentMessage::new(self.agent.id.clone(), target_id.clone(), request, kind)
            .with_coordination_depth(depth)
            .with_metadata(COORDINATED_BY_KEY, self.agent.id.as_str());
        message.thread_id = self.message.thread_id.clone();
        let message_id = message.id.clone();

        self.poster.post(&target_id, message)?;
        debug!(from = %self.agent.id, to = %target_id, depth, "Coordination posted");

        self.bus.publish(EventPayload::CoordinationRequested {
            from: self.agent.id.clone(),
            to: target_id.clone(),
            message_id,
            request: request.to_string(),
            depth,
        });
        Ok(target_id)
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the action and return a one-line summary.
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError>;
}

pub struct UpdatePlanHandler;

#[async_trait]
impl ActionHandler for UpdatePlanHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::UpdatePlan(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        let record = PlanRecord::from_params(ctx.agent.id.clone(), params, ctx.message.thread_id.clone());
        ctx.remember(MemoryKind::Plan, record.render()).await;
        ctx.plans.set(record);

        ctx.bus.publish(EventPayload::PlanUpdated {
            agent_id: ctx.agent.id.clone(),
            summary: params.summary.clone(),
            steps: params.steps.clone(),
            status: params.status.clone(),
        });
        Ok(format!("plan updated: {}", params.summary))
    }
}

pub struct CoordinateHandler;

#[async_trait]
impl ActionHandler for CoordinateHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::CoordinateWithAgent(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        let target = ctx.coordinate(
            &params.target,
            &params.request,
            params.kind.unwrap_or_default(),
        )?;
        Ok(format!("asked {target}"))
    }
}

pub struct ClarifyingQuestionHandler;

#[async_trait]
impl ActionHandler for ClarifyingQuestionHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::AskClarifyingQuestion(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        ctx.conversation
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .add_pending_question(PendingQuestion::from(params));

        ctx.bus.publish(EventPayload::ClarificationRequested {
            agent_id: ctx.agent.id.clone(),
            question: params.question.clone(),
            options: params.options.clone(),
        });
        Ok(format!("asked: {}", params.question))
    }
}

pub struct MilestoneHandler;

#[async_trait]
impl ActionHandler for MilestoneHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::CelebrateMilestone(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        ctx.bus.publish(EventPayload::MilestoneCelebrated {
            agent_id: ctx.agent.id.clone(),
            milestone: params.milestone.clone(),
            message: params.message.clone(),
        });
        Ok(format!("milestone: {}", params.milestone))
    }
}

/// Publishes the task and, when an assignee is named, hands it over.
pub struct CreateTaskHandler;

#[async_trait]
impl ActionHandler for CreateTaskHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::CreateTask(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        let assignee = match &params.assignee {
            Some(target) => Some(
                ctx.poster
                    .resolve(target)
                    .ok_or_else(|| ActionExecutionError::UnknownTarget(target.clone()))?,
            ),
            None => None,
        };
        let priority = params.priority.unwrap_or_default();

        if let Some(assignee) = &assignee
            && *assignee != ctx.agent.id
        {
            let mut request = format!("New task ({}): {}", priority.as_str(), params.title);
            if let Some(description) = &params.description {
                request.push_str("\n\n");
                request.push_str(description);
            }
            ctx.coordinate(assignee.as_str(), &request, MessageKind::Command)?;
        }

        ctx.bus.publish(EventPayload::TaskCreated {
            agent_id: ctx.agent.id.clone(),
            title: params.title.clone(),
            assignee: assignee.clone(),
            priority,
        });
        Ok(match assignee {
            Some(a) => format!("task '{}' assigned to {a}", params.title),
            None => format!("task '{}' created", params.title),
        })
    }
}

pub struct DecisionHandler;

#[async_trait]
impl ActionHandler for DecisionHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::RecordDecision(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        let content = match &params.rationale {
            Some(rationale) => format!("{} (because: {rationale})", params.decision),
            None => params.decision.clone(),
        };
        ctx.remember(MemoryKind::Decision, content).await;

        ctx.bus.publish(EventPayload::DecisionRecorded {
            agent_id: ctx.agent.id.clone(),
            decision: params.decision.clone(),
            rationale: params.rationale.clone(),
        });
        Ok(format!("decision: {}", params.decision))
    }
}

pub struct IssueHandler;

#[async_trait]
impl ActionHandler for IssueHandler {
    async fn handle(
        &self,
        action: &AgentAction,
        ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        let ActionPayload::ReportIssue(params) = &action.payload else {
            return Err(ActionExecutionError::PayloadMismatch(action.kind()));
        };

        if params.severity >= Priority::High {
            warn!(agent = %ctx.agent.id, severity = params.severity.as_str(), title = %params.title, "Issue reported");
        }
        ctx.bus.publish(EventPayload::IssueReported {
            agent_id: ctx.agent.id.clone(),
            title: params.title.clone(),
            severity: params.severity,
            details: params.details.clone(),
        });
        Ok(format!("issue ({}): {}", params.severity.as_str(), params.title))
    }
}

/// The built-in handler for every action kind.
pub fn default_handlers() -> HashMap<ActionKind, Arc<dyn ActionHandler>> {
    let mut handlers: HashMap<ActionKind, Arc<dyn ActionHandler>> = HashMap::new();
    handlers.insert(ActionKind::UpdatePlan, Arc::new(UpdatePlanHandler));
    handlers.insert(ActionKind::CoordinateWithAgent, Arc::new(CoordinateHandler));
    handlers.insert(ActionKind::AskClarifyingQuestion, Arc::new(ClarifyingQuestionHandler));
    handlers.insert(ActionKind::CelebrateMilestone, Arc::new(MilestoneHandler));
    handlers.insert(ActionKind::CreateTask, Arc::new(CreateTaskHandler));
    handlers.insert(ActionKind::RecordDecision, Arc::new(DecisionHandler));
    handlers.insert(ActionKind::ReportIssue, Arc::new(IssueHandler));
    handlers
}
