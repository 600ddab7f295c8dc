//! Action entities - the closed vocabulary of side effects an agent may
//! request in its reply.

use crate::message::MessageKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of an [`AgentAction`]; the wire name is the kebab-case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    UpdatePlan,
    CoordinateWithAgent,
    AskClarifyingQuestion,
    CelebrateMilestone,
    CreateTask,
    RecordDecision,
    ReportIssue,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::UpdatePlan,
        ActionKind::CoordinateWithAgent,
        ActionKind::AskClarifyingQuestion,
        ActionKind::CelebrateMilestone,
        ActionKind::CreateTask,
        ActionKind::RecordDecision,
        ActionKind::ReportIssue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::UpdatePlan => "update-plan",
            ActionKind::CoordinateWithAgent => "coordinate-with-agent",
            ActionKind::AskClarifyingQuestion => "ask-clarifying-question",
            ActionKind::CelebrateMilestone => "celebrate-milestone",
            ActionKind::CreateTask => "create-task",
            ActionKind::RecordDecision => "record-decision",
            ActionKind::ReportIssue => "report-issue",
        }
    }

    /// One-line usage hint rendered into persona system prompts.
    pub fn usage(&self) -> &'static str {
        match self {
            ActionKind::UpdatePlan => {
                r#"update-plan {"summary": str, "steps": [str], "status": str?}"#
            }
            ActionKind::CoordinateWithAgent => {
                r#"coordinate-with-agent {"target": "producer|architect|engineer|qa", "request": str}"#
            }
            ActionKind::AskClarifyingQuestion => {
                r#"ask-clarifying-question {"question": str, "options": [str]}"#
            }
            ActionKind::CelebrateMilestone => {
                r#"celebrate-milestone {"milestone": str, "message": str?}"#
            }
            ActionKind::CreateTask => {
                r#"create-task {"title": str, "description": str?, "assignee": str?, "priority": "low|medium|high|critical"?}"#
            }
            ActionKind::RecordDecision => {
                r#"record-decision {"decision": str, "rationale": str?}"#
            }
            ActionKind::ReportIssue => {
                r#"report-issue {"title": str, "severity": "low|medium|high|critical", "details": str?}"#
            }
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Shared severity / priority scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlanParams {
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateParams {
    /// Agent id or agent type name
    pub target: String,
    pub request: String,
    #[serde(default)]
    pub kind: Option<MessageKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClarifyingQuestionParams {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MilestoneParams {
    pub milestone: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskParams {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Agent id or agent type name
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionParams {
    pub decision: String,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueParams {
    pub title: String,
    pub severity: Priority,
    #[serde(default)]
    pub details: Option<String>,
}

/// Typed parameter payload of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
pub enum ActionPayload {
    UpdatePlan(UpdatePlanParams),
    CoordinateWithAgent(CoordinateParams),
    AskClarifyingQuestion(ClarifyingQuestionParams),
    CelebrateMilestone(MilestoneParams),
    CreateTask(CreateTaskParams),
    RecordDecision(DecisionParams),
    ReportIssue(IssueParams),
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::UpdatePlan(_) => ActionKind::UpdatePlan,
            ActionPayload::CoordinateWithAgent(_) => ActionKind::CoordinateWithAgent,
            ActionPayload::AskClarifyingQuestion(_) => ActionKind::AskClarifyingQuestion,
            ActionPayload::CelebrateMilestone(_) => ActionKind::CelebrateMilestone,
            ActionPayload::CreateTask(_) => ActionKind::CreateTask,
            ActionPayload::RecordDecision(_) => ActionKind::RecordDecision,
            ActionPayload::ReportIssue(_) => ActionKind::ReportIssue,
        }
    }

    /// Deserialize the params object for a known kind.
    pub fn from_params(
        kind: ActionKind,
        params: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ActionKind::UpdatePlan => ActionPayload::UpdatePlan(serde_json::from_value(params)?),
            ActionKind::CoordinateWithAgent => {
                ActionPayload::CoordinateWithAgent(serde_json::from_value(params)?)
            }
            ActionKind::AskClarifyingQuestion => {
                ActionPayload::AskClarifyingQuestion(serde_json::from_value(params)?)
            }
            ActionKind::CelebrateMilestone => {
                ActionPayload::CelebrateMilestone(serde_json::from_value(params)?)
            }
            ActionKind::CreateTask => ActionPayload::CreateTask(serde_json::from_value(params)?),
            ActionKind::RecordDecision => {
                ActionPayload::RecordDecision(serde_json::from_value(params)?)
            }
            ActionKind::ReportIssue => ActionPayload::ReportIssue(serde_json::from_value(params)?),
        })
    }
}

/// A structured side-effect request extracted from an agent reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAction {
    #[serde(flatten)]
    pub payload: ActionPayload,
    /// A human must approve before the action runs
    pub requires_confirmation: bool,
}

impl AgentAction {
    pub fn new(payload: ActionPayload) -> Self {
        Self {
            payload,
            requires_confirmation: false,
        }
    }

    pub fn with_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    // ==================== Convenience Constructors ====================

    pub fn update_plan(summary: impl Into<String>, steps: Vec<String>) -> Self {
        Self::new(ActionPayload::UpdatePlan(UpdatePlanParams {
            summary: summary.into(),
            steps,
            status: None,
        }))
    }

    pub fn coordinate(target: impl Into<String>, request: impl Into<String>) -> Self {
        Self::new(ActionPayload::CoordinateWithAgent(CoordinateParams {
            target: target.into(),
            request: request.into(),
            kind: None,
        }))
    }

    pub fn ask(question: impl Into<String>) -> Self {
        Self::new(ActionPayload::AskClarifyingQuestion(
            ClarifyingQuestionParams {
                question: question.into(),
                options: Vec::new(),
            },
        ))
    }

    pub fn celebrate(milestone: impl Into<String>) -> Self {
        Self::new(ActionPayload::CelebrateMilestone(MilestoneParams {
            milestone: milestone.into(),
            message: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert!("deploy-to-prod".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_serialize_action_shape() {
        let action = AgentAction::celebrate("MVP shipped").with_confirmation();
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "celebrate-milestone");
        assert_eq!(json["params"]["milestone"], "MVP shipped");
        assert_eq!(json["requires_confirmation"], true);
    }

    #[test]
    fn test_from_params_rejects_unknown_field() {
        let result = ActionPayload::from_params(
            ActionKind::RecordDecision,
            serde_json::json!({"decision": "Use Postgres", "mood": "happy"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_params_requires_fields() {
        let result = ActionPayload::from_params(
            ActionKind::ReportIssue,
            serde_json::json!({"title": "Crash on save"}),
        );
        assert!(result.is_err(), "severity is required");
    }
}
