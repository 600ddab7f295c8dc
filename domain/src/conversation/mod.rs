//! Conversation context kept per agent.
//!
//! A bounded, insertion-ordered history of what the agent has seen and said,
//! plus the clarifying questions it is still waiting on. Persona strategies
//! read fixed-size windows from the tail when building prompts.

use crate::action::ClarifyingQuestionParams;
use crate::message::AgentMessage;
use crate::session::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Window sizes used when building prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWindows {
    /// Most recent entries considered by the analysis pass
    pub analysis: usize,
    /// Pending questions considered by the response pass
    pub pending_questions: usize,
    /// Entries retained before the oldest is evicted
    pub capacity: usize,
}

impl Default for ContextWindows {
    fn default() -> Self {
        Self {
            analysis: 5,
            pending_questions: 3,
            capacity: 20,
        }
    }
}

/// One remembered exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    /// "user" or an agent id
    pub speaker: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A clarifying question the agent asked and has not seen answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub asked_at: DateTime<Utc>,
}

impl From<&ClarifyingQuestionParams> for PendingQuestion {
    fn from(params: &ClarifyingQuestionParams) -> Self {
        Self {
            question: params.question.clone(),
            options: params.options.clone(),
            asked_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    entries: VecDeque<ConversationEntry>,
    pending: VecDeque<PendingQuestion>,
    windows: ContextWindows,
}

impl ConversationContext {
    pub fn new(windows: ContextWindows) -> Self {
        Self {
            entries: VecDeque::new(),
            pending: VecDeque::new(),
            windows,
        }
    }

    pub fn windows(&self) -> ContextWindows {
        self.windows
    }

    /// Append an entry, evicting the oldest once the capacity is exceeded.
    pub fn push(&mut self, role: Role, speaker: impl Into<String>, text: impl Into<String>) {
        self.entries.push_back(ConversationEntry {
            role,
            speaker: speaker.into(),
            text: text.into(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.windows.capacity {
            self.entries.pop_front();
        }
    }

    pub fn record_inbound(&mut self, message: &AgentMessage) {
        self.push(Role::User, message.sender.to_string(), message.content.clone());
    }

    pub fn record_reply(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.push(Role::Assistant, speaker, text);
    }

    /// The last `n` entries, oldest first.
    pub fn window(&self, n: usize) -> impl Iterator<Item = &ConversationEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn analysis_window(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.window(self.windows.analysis)
    }

    pub fn add_pending_question(&mut self, question: PendingQuestion) {
        self.pending.push_back(question);
        while self.pending.len() > self.windows.capacity {
            self.pending.pop_front();
        }
    }

    /// The last `n` pending questions, oldest first.
    pub fn pending_window(&self, n: usize) -> impl Iterator<Item = &PendingQuestion> {
        let skip = self.pending.len().saturating_sub(n);
        self.pending.iter().skip(skip)
    }

    pub fn questions_window(&self) -> impl Iterator<Item = &PendingQuestion> {
        self.pending_window(self.windows.pending_questions)
    }

    /// Drop pending questions once the user has answered.
    pub fn clear_pending_questions(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ConversationContext {
        ConversationContext::new(ContextWindows {
            analysis: 2,
            pending_questions: 1,
            capacity: 3,
        })
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut ctx = small();
        for i in 0..5 {
            ctx.push(Role::User, "user", format!("m{i}"));
        }
        assert_eq!(ctx.len(), 3);
        let texts: Vec<_> = ctx.window(10).map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_analysis_window_takes_tail() {
        let mut ctx = small();
        ctx.push(Role::User, "user", "a");
        ctx.push(Role::Assistant, "producer", "b");
        ctx.push(Role::User, "user", "c");
        let texts: Vec<_> = ctx.analysis_window().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn test_default_windows() {
        let windows = ContextWindows::default();
        assert_eq!(windows.analysis, 5);
        assert_eq!(windows.pending_questions, 3);
        assert_eq!(windows.capacity, 20);

        let mut ctx = ConversationContext::default();
        for i in 0..25 {
            ctx.push(Role::User, "user", i.to_string());
        }
        assert_eq!(ctx.len(), 20);
        assert_eq!(ctx.analysis_window().count(), 5);
    }

    #[test]
    fn test_pending_questions_window() {
        let mut ctx = small();
        for q in ["Which DB?", "Which cloud?"] {
            ctx.add_pending_question(PendingQuestion {
                question: q.into(),
                options: vec![],
                asked_at: Utc::now(),
            });
        }
        let window: Vec<_> = ctx.questions_window().map(|q| q.question.as_str()).collect();
        assert_eq!(window, vec!["Which cloud?"]);

        ctx.clear_pending_questions();
        assert_eq!(ctx.pending_len(), 0);
    }

    #[test]
    fn test_record_inbound_uses_sender() {
        let mut ctx = ConversationContext::default();
        ctx.record_inbound(&AgentMessage::from_user("producer", "Hello"));
        let entry = ctx.window(1).next().unwrap();
        assert_eq!(entry.speaker, "user");
        assert_eq!(entry.role, Role::User);
    }
}
