//! Persona strategies: per-role prompt construction over a two-call pattern.
//!
//! Every persona first runs an analysis pass over the most recent context
//! entries (plus memory hits, when memory is configured), then a response
//! pass that also sees the questions the agent is still waiting on.

use crate::ports::memory::MemoryPort;
use crate::ports::model_gateway::{GatewayError, GenerationOptions, ModelGateway};
use async_trait::async_trait;
use crew_domain::{
    ActionKind, Agent, AgentConfiguration, AgentMessage, AgentPromptTemplate, AgentType,
    ConversationContext, PersonaProfile, Turn,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Memory hits included in the analysis pass.
pub const MEMORY_HITS: usize = 3;

#[async_trait]
pub trait PersonaStrategy: Send + Sync {
    fn profile(&self) -> &'static PersonaProfile;

    fn agent_type(&self) -> AgentType {
        self.profile().agent_type
    }

    /// Action kinds this persona may request.
    fn tool_vocabulary(&self) -> &'static [ActionKind] {
        self.profile().vocabulary
    }

    fn build_system_prompt(&self, agent: &Agent) -> String;

    fn build_analysis_prompt(
        &self,
        message: &AgentMessage,
        context: &ConversationContext,
        memories: &[String],
    ) -> String {
        AgentPromptTemplate::analysis(message, context.analysis_window(), memories)
    }

    fn build_response_prompt(
        &self,
        analysis: &str,
        message: &AgentMessage,
        context: &ConversationContext,
        config: &AgentConfiguration,
    ) -> String {
        AgentPromptTemplate::response(message, analysis, context.questions_window(), config)
    }

    /// Run the analysis pass, then the response pass, and return the raw reply.
    async fn process_message(
        &self,
        agent: &Agent,
        message: &AgentMessage,
        context: &ConversationContext,
        model: &dyn ModelGateway,
        memory: Option<&dyn MemoryPort>,
    ) -> Result<String, GatewayError> {
        let options = GenerationOptions::from(&agent.config);
        let system = self.build_system_prompt(agent);

        let memories: Vec<String> = match memory {
            Some(memory) => match memory.search(&message.content, MEMORY_HITS).await {
                Ok(entries) => entries.iter().map(|e| e.to_prompt_line()).collect(),
                Err(e) => {
                    warn!(agent = %agent.id, error = %e, "Memory search failed, continuing without");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let analysis_prompt = self.build_analysis_prompt(message, context, &memories);
        let analysis = model
            .generate(&[Turn::system(&system), Turn::user(analysis_prompt)], &options)
            .await?;
        debug!(agent = %agent.id, chars = analysis.len(), "Analysis pass complete");

        let response_prompt = self.build_response_prompt(&analysis, message, context, &agent.config);
        model
            .generate(&[Turn::system(system), Turn::user(response_prompt)], &options)
            .await
    }
}

pub struct ProducerPersona;

#[async_trait]
impl PersonaStrategy for ProducerPersona {
    fn profile(&self) -> &'static PersonaProfile {
        PersonaProfile::for_type(AgentType::Producer)
    }

    fn build_system_prompt(&self, agent: &Agent) -> String {
        format!(
            "{}\n\n## Delegation\n\nThe operator talks to you first. Answer simple \
             questions yourself; route design questions to `architect`, build work to \
             `engineer` and verification to `qa` with coordinate-with-agent.",
            AgentPromptTemplate::system(self.profile(), &agent.name, &agent.config)
        )
    }
}

pub struct ArchitectPersona;

#[async_trait]
impl PersonaStrategy for ArchitectPersona {
    fn profile(&self) -> &'static PersonaProfile {
        PersonaProfile::for_type(AgentType::Architect)
    }

    fn build_system_prompt(&self, agent: &Agent) -> String {
        format!(
            "{}\n\n## Decisions\n\nWhen you settle a design question, record it with \
             record-decision and a one-sentence rationale so the rest of the crew can \
             find it later.",
            AgentPromptTemplate::system(self.profile(), &agent.name, &agent.config)
        )
    }
}

pub struct EngineerPersona;

#[async_trait]
impl PersonaStrategy for EngineerPersona {
    fn profile(&self) -> &'static PersonaProfile {
        PersonaProfile::for_type(AgentType::Engineer)
    }

    fn build_system_prompt(&self, agent: &Agent) -> String {
        format!(
            "{}\n\n## Progress\n\nKeep the plan's steps in sync with what you have \
             actually built. Report anything that blocks you with report-issue.",
            AgentPromptTemplate::system(self.profile(), &agent.name, &agent.config)
        )
    }
}

pub struct QaPersona;

#[async_trait]
impl PersonaStrategy for QaPersona {
    fn profile(&self) -> &'static PersonaProfile {
        PersonaProfile::for_type(AgentType::Qa)
    }

    fn build_system_prompt(&self, agent: &Agent) -> String {
        format!(
            "{}\n\n## Verification\n\nEvery defect gets a severity. Assign fixes to \
             `engineer` with create-task; celebrate a milestone only after it passes.",
            AgentPromptTemplate::system(self.profile(), &agent.name, &agent.config)
        )
    }
}

/// Default strategy for each role.
pub fn persona_for(agent_type: AgentType) -> Arc<dyn PersonaStrategy> {
    match agent_type {
        AgentType::Producer => Arc::new(ProducerPersona),
        AgentType::Architect => Arc::new(ArchitectPersona),
        AgentType::Engineer => Arc::new(EngineerPersona),
        AgentType::Qa => Arc::new(QaPersona),
    }
}
