//! Console output formatter for crew responses, statuses and events

use colored::{ColoredString, Colorize};
use crew_application::RouterError;
use crew_domain::{
    ActionOutcome, Agent, AgentId, AgentMessage, AgentResponse, AgentStatus, DomainEvent,
    EventPayload,
};

/// Longest message excerpt shown in queue listings and event lines.
const EXCERPT_CHARS: usize = 72;

/// Formats crew output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format an agent's reply with its action outcomes and non-fatal errors
    pub fn format_response(name: &str, response: &AgentResponse) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {}\n",
            format!("── {} ──", name).yellow().bold(),
            format!("({} ms)", response.duration_ms).dimmed()
        ));
        output.push_str(&response.content);
        output.push('\n');

        if !response.outcomes.is_empty() {
            output.push_str(&format!("\n{}\n", "Actions:".cyan().bold()));
            for outcome in &response.outcomes {
                output.push_str(&Self::format_outcome(outcome));
                output.push('\n');
            }
        }

        if !response.errors.is_empty() {
            output.push_str(&format!("\n{}\n", "Problems:".red().bold()));
            for error in &response.errors {
                output.push_str(&format!("  {} {}\n", "x".red(), error));
            }
        }

        if let Some(status) = response.status_update {
            output.push_str(&format!(
                "\n{} {}\n",
                "Status:".cyan().bold(),
                Self::status_label(status)
            ));
        }

        output
    }

    fn format_outcome(outcome: &ActionOutcome) -> String {
        match outcome {
            ActionOutcome::Executed { kind, summary, .. } => {
                format!("  {} {} {}", "v".green(), kind.to_string().bold(), summary)
            }
            ActionOutcome::Failed { kind, error, .. } => {
                format!("  {} {} {}", "x".red(), kind.to_string().bold(), error.red())
            }
            ActionOutcome::Skipped { kind, reason, .. } => {
                format!(
                    "  {} {} {}",
                    "-".yellow(),
                    kind.to_string().bold(),
                    format!("skipped: {}", reason).dimmed()
                )
            }
        }
    }

    /// Format a table of agents with status and statistics
    pub fn format_status_table(agents: &[Agent]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", "=== Crew Status ===".cyan().bold()));

        let id_width = agents
            .iter()
            .map(|a| a.id.as_str().len())
            .max()
            .unwrap_or(0)
            .max(2);

        for agent in agents {
            output.push_str(&format!(
                "  {:<width$}  {:<9}  {}\n",
                agent.id.as_str(),
                Self::status_label(agent.status),
                agent.name.bold(),
                width = id_width,
            ));
            output.push_str(&format!(
                "  {:<width$}  {}\n",
                "",
                format!(
                    "messages {} | tasks {} | errors {} | avg {:.0} ms",
                    agent.stats.messages_processed,
                    agent.stats.tasks_completed,
                    agent.stats.error_count,
                    agent.stats.average_response_time_ms
                )
                .dimmed(),
                width = id_width,
            ));
        }
        output
    }

    /// Format an agent's pending mailbox, head first
    pub fn format_queue(agent_id: &AgentId, messages: &[AgentMessage]) -> String {
        if messages.is_empty() {
            return format!("{} has no pending messages\n", agent_id.as_str().bold());
        }

        let mut output = format!(
            "{} {}\n",
            format!("Queue for {}:", agent_id).cyan().bold(),
            format!("({} pending)", messages.len()).dimmed()
        );
        for (i, message) in messages.iter().enumerate() {
            let marker = if i == 0 { ">" } else { " " };
            output.push_str(&format!(
                "  {} {} {} {}\n",
                marker,
                message.sender.to_string().bold(),
                format!("[{}]", message.kind.as_str()).dimmed(),
                excerpt(&message.content)
            ));
        }
        output
    }

    /// One-line rendering of a domain event
    pub fn format_event(event: &DomainEvent) -> String {
        let line = match &event.payload {
            EventPayload::AgentCreated { agent_id, name, .. } => {
                format!("{} joined as {}", name.bold(), agent_id)
            }
            EventPayload::StatusChanged { agent_id, from, to } => format!(
                "{} {} -> {}",
                agent_id.as_str().bold(),
                from.as_str().dimmed(),
                Self::status_label(*to)
            ),
            EventPayload::MessageSent {
                agent_id,
                sender,
                content,
                ..
            } => format!(
                "{} -> {}: {}",
                sender,
                agent_id.as_str().bold(),
                excerpt(content)
            ),
            EventPayload::ResponseReceived {
                agent_id,
                action_count,
                error_count,
                duration_ms,
                ..
            } => {
                let summary = format!(
                    "{} action(s), {} problem(s), {} ms",
                    action_count, error_count, duration_ms
                );
                format!("{} replied ({})", agent_id.as_str().bold(), summary)
            }
            EventPayload::CoordinationRequested {
                from, to, request, ..
            } => format!(
                "{} asks {}: {}",
                from.as_str().bold(),
                to.as_str().bold(),
                excerpt(request)
            ),
            EventPayload::PlanUpdated {
                agent_id, summary, steps, ..
            } => format!(
                "{} updated the plan: {} ({} steps)",
                agent_id.as_str().bold(),
                summary,
                steps.len()
            ),
            EventPayload::MilestoneCelebrated {
                agent_id,
                milestone,
                ..
            } => format!(
                "{} celebrates: {}",
                agent_id.as_str().bold(),
                milestone.green().bold()
            ),
            EventPayload::ClarificationRequested {
                agent_id,
                question,
                options,
            } => {
                let mut line = format!("{} asks you: {}", agent_id.as_str().bold(), question);
                if !options.is_empty() {
                    line.push_str(&format!(" [{}]", options.join(" / ")));
                }
                line
            }
            EventPayload::TaskCreated {
                agent_id,
                title,
                assignee,
                priority,
            } => {
                let assignee = assignee
                    .as_ref()
                    .map(|a| format!(" for {}", a))
                    .unwrap_or_default();
                format!(
                    "{} created task \"{}\"{} ({})",
                    agent_id.as_str().bold(),
                    title,
                    assignee,
                    priority.as_str()
                )
            }
            EventPayload::DecisionRecorded {
                agent_id, decision, ..
            } => format!("{} decided: {}", agent_id.as_str().bold(), decision),
            EventPayload::IssueReported {
                agent_id,
                title,
                severity,
                ..
            } => format!(
                "{} reported {} issue: {}",
                agent_id.as_str().bold(),
                severity.as_str(),
                title.red()
            ),
            EventPayload::Error {
                agent_id, error, ..
            } => match agent_id {
                Some(id) => format!("{} {}: {}", "error".red().bold(), id, error),
                None => format!("{} {}", "error".red().bold(), error),
            },
        };
        format!("{} {}", "*".dimmed(), line)
    }

    pub fn format_error(error: &RouterError) -> String {
        let hint = match error {
            RouterError::AgentInErrorState(id) => format!(" (try /recover {})", id),
            _ => String::new(),
        };
        format!("{} {}{}", "Error:".red().bold(), error, hint.dimmed())
    }

    pub fn status_label(status: AgentStatus) -> ColoredString {
        let label = status.as_str();
        match status {
            AgentStatus::Idle => label.green(),
            AgentStatus::Thinking | AgentStatus::Working => label.cyan(),
            AgentStatus::Waiting => label.yellow(),
            AgentStatus::Error => label.red().bold(),
            AgentStatus::Offline => label.dimmed(),
        }
    }
}

fn excerpt(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > EXCERPT_CHARS || first_line.len() < text.trim_end().len() {
        let cut: String = first_line.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        first_line.to_string()
    }
}
