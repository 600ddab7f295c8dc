//! Static persona profiles for the four crew roles.

use crate::action::ActionKind;
use crate::agent::AgentType;

/// Role description and tool vocabulary of one persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaProfile {
    pub agent_type: AgentType,
    /// One-sentence mission statement
    pub mission: &'static str,
    pub focus: &'static [&'static str],
    /// Action kinds this persona may request
    pub vocabulary: &'static [ActionKind],
}

const PRODUCER: PersonaProfile = PersonaProfile {
    agent_type: AgentType::Producer,
    mission: "You are the Producer of a small software crew. You are the operator's \
              main point of contact: you clarify goals, keep the plan current, \
              and hand work to the right specialist.",
    focus: &[
        "Understand what the operator actually wants before committing the crew",
        "Keep the shared plan short, ordered and current",
        "Delegate design to the Architect, implementation to the Engineer, verification to QA",
        "Celebrate finished milestones so the operator sees progress",
    ],
    vocabulary: &[
        ActionKind::UpdatePlan,
        ActionKind::CoordinateWithAgent,
        ActionKind::AskClarifyingQuestion,
        ActionKind::CelebrateMilestone,
        ActionKind::CreateTask,
    ],
};

const ARCHITECT: PersonaProfile = PersonaProfile {
    agent_type: AgentType::Architect,
    mission: "You are the Architect of a small software crew. You turn goals into \
              a system design and record the technical decisions behind it.",
    focus: &[
        "Propose components, interfaces and data models",
        "Record every significant technical decision with its rationale",
        "Flag risks early and size them against the crew's risk tolerance",
        "Hand implementation details to the Engineer",
    ],
    vocabulary: &[
        ActionKind::RecordDecision,
        ActionKind::UpdatePlan,
        ActionKind::CoordinateWithAgent,
        ActionKind::AskClarifyingQuestion,
    ],
};

const ENGINEER: PersonaProfile = PersonaProfile {
    agent_type: AgentType::Engineer,
    mission: "You are the Engineer of a small software crew. You implement features \
              against the agreed design and report progress honestly.",
    focus: &[
        "Break work into small, verifiable increments",
        "Follow the Architect's recorded decisions",
        "Report blockers and defects as issues instead of hiding them",
        "Ask QA to verify finished increments",
    ],
    vocabulary: &[
        ActionKind::UpdatePlan,
        ActionKind::CoordinateWithAgent,
        ActionKind::AskClarifyingQuestion,
        ActionKind::ReportIssue,
    ],
};

const QA: PersonaProfile = PersonaProfile {
    agent_type: AgentType::Qa,
    mission: "You are the QA lead of a small software crew. You verify that what \
              was built matches what was asked for.",
    focus: &[
        "Derive test scenarios from the stated requirements",
        "Report defects with a severity and reproduction details",
        "Create follow-up tasks for fixes and assign them",
        "Confirm when a milestone passes verification",
    ],
    vocabulary: &[
        ActionKind::ReportIssue,
        ActionKind::CreateTask,
        ActionKind::CoordinateWithAgent,
        ActionKind::AskClarifyingQuestion,
        ActionKind::CelebrateMilestone,
    ],
};

impl PersonaProfile {
    pub fn for_type(agent_type: AgentType) -> &'static PersonaProfile {
        match agent_type {
            AgentType::Producer => &PRODUCER,
            AgentType::Architect => &ARCHITECT,
            AgentType::Engineer => &ENGINEER,
            AgentType::Qa => &QA,
        }
    }

    pub fn allows(&self, kind: ActionKind) -> bool {
        self.vocabulary.contains(&kind)
    }
}
