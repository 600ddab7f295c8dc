//! Response processor: turns a raw model reply into content, actions and
//! a status directive, then executes the actions in order.
//!
//! Nothing in here fails a response: malformed action blocks, actions
//! outside the persona's vocabulary and failing handlers all end up as
//! [`ProcessingError`] entries next to the successful reply.

pub mod handlers;
pub mod plan_board;

use crate::error::ActionExecutionError;
use crate::ports::confirmation::{ConfirmationDecision, ConfirmationPort};
use futures::FutureExt;
use handlers::{ActionContext, ActionHandler, default_handlers};
use crew_domain::{
    ActionKind, ActionOutcome, AgentAction, AgentStatus, ProcessingError, extract_actions,
};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of interpreting a reply against a persona's vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpretation {
    /// Reply text with the actions block removed
    pub content: String,
    /// Surviving actions, each with its position in the extracted list
    pub actions: Vec<(usize, AgentAction)>,
    pub status_update: Option<AgentStatus>,
    pub errors: Vec<ProcessingError>,
}

/// Outcomes and errors of running a list of actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub outcomes: Vec<ActionOutcome>,
    pub errors: Vec<ProcessingError>,
}

impl ExecutionReport {
    pub fn executed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_executed()).count()
    }
}

pub struct ResponseProcessor {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
    confirmation: Arc<dyn ConfirmationPort>,
}

impl ResponseProcessor {
    pub fn new(confirmation: Arc<dyn ConfirmationPort>) -> Self {
        Self {
            handlers: default_handlers(),
            confirmation,
        }
    }

    /// Replace the handler for one action kind.
    pub fn with_handler(mut self, kind: ActionKind, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Extract actions from `raw` and drop those outside `vocabulary`.
    pub fn interpret(&self, raw: &str, vocabulary: &[ActionKind]) -> Interpretation {
        let extraction = extract_actions(raw);

        let mut errors: Vec<ProcessingError> = extraction
            .errors
            .iter()
            .map(|e| ProcessingError::extraction(e.to_string()))
            .collect();
        for e in &errors {
            warn!(error = %e, "Action extraction degraded");
        }

        let mut actions = Vec::with_capacity(extraction.actions.len());
        for (index, action) in extraction.actions.into_iter().enumerate() {
            let kind = action.kind();
            if vocabulary.contains(&kind) {
                actions.push((index, action));
            } else {
                debug!(index, %kind, "Dropping action outside persona vocabulary");
                errors.push(ProcessingError::action(
                    index,
                    kind,
                    "not available to this agent",
                ));
            }
        }

        Interpretation {
            content: extraction.content,
            actions,
            status_update: extraction.status_update,
            errors,
        }
    }

    /// Run `actions` strictly in order. A failing handler is recorded and
    /// execution moves on to the next action.
    pub async fn execute(
        &self,
        actions: &[(usize, AgentAction)],
        ctx: &ActionContext,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for (index, action) in actions {
            let index = *index;
            let kind = action.kind();

            if action.requires_confirmation && !ctx.agent.config.skips_confirmation() {
                let reason = match self.confirmation.confirm(&ctx.agent, action).await {
                    Ok(ConfirmationDecision::Approve) => None,
                    Ok(ConfirmationDecision::Decline(reason)) => Some(reason),
                    Err(e) => Some(e.to_string()),
                };
                if let Some(reason) = reason {
                    info!(agent = %ctx.agent.id, index, %kind, %reason, "Action not confirmed");
                    report.outcomes.push(ActionOutcome::Skipped { index, kind, reason });
                    continue;
                }
            }

            let Some(handler) = self.handlers.get(&kind) else {
                let error = "no handler registered".to_string();
                report.errors.push(ProcessingError::action(index, kind, &error));
                report.outcomes.push(ActionOutcome::Failed { index, kind, error });
                continue;
            };

            let result = AssertUnwindSafe(handler.handle(action, ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ActionExecutionError::Failed("handler panicked".into())));

            match result {
                Ok(summary) => {
                    debug!(agent = %ctx.agent.id, index, %kind, %summary, "Action executed");
                    report.outcomes.push(ActionOutcome::Executed { index, kind, summary });
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(agent = %ctx.agent.id, index, %kind, %error, "Action failed");
                    report.errors.push(ProcessingError::action(index, kind, &error));
                    report.outcomes.push(ActionOutcome::Failed { index, kind, error });
                }
            }
        }

        report
    }
}
