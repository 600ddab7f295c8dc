//! Prompt templates for the crew personas

use super::persona::PersonaProfile;
use crate::agent::{AgentConfiguration, CommunicationStyle, QuestionFrequency, Verbosity};
use crate::conversation::{ConversationEntry, PendingQuestion};
use crate::core::string::clip;
use crate::message::AgentMessage;

/// Characters of each history entry quoted into the analysis prompt.
const HISTORY_EXCERPT_CHARS: usize = 400;

/// Templates for generating persona prompts
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt for a persona, shaped by the agent's configuration
    pub fn system(profile: &PersonaProfile, name: &str, config: &AgentConfiguration) -> String {
        let focus = profile
            .focus
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");

        let actions = profile
            .vocabulary
            .iter()
            .map(|k| format!("- {}", k.usage()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"{mission}

Your name is {name}.

## Focus

{focus}

## Working Style

{style}

## Actions

You may request side effects by ending your reply with a fenced `actions` block.
Only these action types are available to you:

{actions}

Format:

```actions
{{
  "status": "idle | waiting",
  "actions": [
    {{"type": "<action type>", "params": {{}}, "requires_confirmation": false}}
  ]
}}
```

Omit the block entirely when no action is needed. Set `requires_confirmation`
for anything the operator should approve first."#,
            mission = profile.mission,
            name = name,
            focus = focus,
            style = Self::style_guidance(config),
            actions = actions,
        )
    }

    /// First pass: understand the message in light of recent history
    pub fn analysis<'a>(
        message: &AgentMessage,
        history: impl IntoIterator<Item = &'a ConversationEntry>,
        memories: &[String],
    ) -> String {
        let history = history
            .into_iter()
            .map(|e| format!("[{}] {}", e.speaker, clip(&e.text, HISTORY_EXCERPT_CHARS)))
            .collect::<Vec<_>>();
        let history = if history.is_empty() {
            "(no earlier conversation)".to_string()
        } else {
            history.join("\n")
        };

        let memory_section = if memories.is_empty() {
            String::new()
        } else {
            let items = memories
                .iter()
                .map(|m| format!("- {m}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("## Relevant Memory\n\n{items}\n\n")
        };

        format!(
            r#"## Task

Analyze the incoming message before replying. Do not reply yet.

## Recent Conversation

{history}

{memory_section}## Incoming Message

From: {sender}
Kind: {kind}

{content}

## Instructions

In a few short bullet points, state:
1. What the sender is asking for
2. What you still need to know
3. Which crew member, if any, should be involved
4. Which of your actions, if any, would help"#,
            history = history,
            memory_section = memory_section,
            sender = message.sender,
            kind = message.kind.as_str(),
            content = message.content,
        )
    }

    /// Second pass: write the reply, with the analysis and open questions
    pub fn response<'a>(
        message: &AgentMessage,
        analysis: &str,
        pending: impl IntoIterator<Item = &'a PendingQuestion>,
        config: &AgentConfiguration,
    ) -> String {
        let pending = pending
            .into_iter()
            .map(|q| {
                if q.options.is_empty() {
                    format!("- {}", q.question)
                } else {
                    format!("- {} (options: {})", q.question, q.options.join(", "))
                }
            })
            .collect::<Vec<_>>();
        let pending = if pending.is_empty() {
            "(none)".to_string()
        } else {
            pending.join("\n")
        };

        format!(
            r#"## Your Analysis

{analysis}

## Questions You Are Still Waiting On

{pending}

## Message To Answer

{content}

## Instructions

Write your reply to {sender}. Keep it under {max} characters.
If the message answers one of your open questions, acknowledge it.
Append an `actions` block only if an action is warranted."#,
            analysis = analysis.trim(),
            pending = pending,
            content = message.content,
            sender = message.sender,
            max = config.max_response_length,
        )
    }

    fn style_guidance(config: &AgentConfiguration) -> String {
        let tone = match config.communication_style {
            CommunicationStyle::Formal => "Write formally and precisely.",
            CommunicationStyle::Casual => "Write casually, like a teammate in chat.",
            CommunicationStyle::Professional => "Write in a clear, professional tone.",
            CommunicationStyle::Friendly => "Write warmly and encouragingly.",
        };
        let length = match config.verbosity {
            Verbosity::Concise => "Keep replies short; bullet points over paragraphs.",
            Verbosity::Balanced => "Give enough detail to act on, no more.",
            Verbosity::Verbose => "Explain your reasoning in detail.",
        };
        let questions = match config.question_frequency {
            QuestionFrequency::Minimal => "Ask questions only when you are blocked.",
            QuestionFrequency::Normal => "Ask a clarifying question when requirements are ambiguous.",
            QuestionFrequency::Frequent => "Confirm assumptions with the operator often.",
        };

        format!(
            "- {tone}\n- {length}\n- {questions}\n\
             - Proactiveness {p}/100: {p_hint}\n\
             - Creativity {c}/100: {c_hint}\n\
             - Risk tolerance {r}/100: {r_hint}\n\
             - Never exceed {max} characters per reply.",
            tone = tone,
            length = length,
            questions = questions,
            p = config.proactiveness,
            p_hint = scale_hint(config.proactiveness, "wait to be asked", "suggest next steps unprompted"),
            c = config.creativity,
            c_hint = scale_hint(config.creativity, "prefer proven approaches", "explore unconventional ideas"),
            r = config.risk_tolerance,
            r_hint = scale_hint(config.risk_tolerance, "avoid risky changes", "accept risk for speed"),
            max = config.max_response_length,
        )
    }
}

fn scale_hint(value: u8, low: &'static str, high: &'static str) -> &'static str {
    match value {
        0..=33 => low,
        67.. => high,
        _ => "balance both",
    }
}
