//! REPL (Read-Eval-Print Loop) for chatting with the crew

use crate::ConsoleFormatter;
use colored::Colorize;
use crew_application::{AgentRouter, RouterError};
use crew_domain::{AgentId, AgentMessage};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    /// Message for an agent; `None` means the default agent
    Send { agent: Option<String>, text: String },
    Status,
    Queue(String),
    Recover(String),
    Help,
    Quit,
    Usage(&'static str),
    Unknown(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplInput::Empty;
        }

        if let Some(rest) = line.strip_prefix('@') {
            let (agent, text) = split_word(rest);
            if agent.is_empty() || text.is_empty() {
                return ReplInput::Usage("@<agent> <message>");
            }
            return ReplInput::Send {
                agent: Some(agent.to_string()),
                text: text.to_string(),
            };
        }

        if !line.starts_with('/') {
            return ReplInput::Send {
                agent: None,
                text: line.to_string(),
            };
        }

        let (command, arg) = split_word(line);
        match command {
            "/quit" | "/exit" | "/q" => ReplInput::Quit,
            "/help" | "/h" | "/?" => ReplInput::Help,
            "/status" => ReplInput::Status,
            "/queue" if !arg.is_empty() => ReplInput::Queue(arg.to_string()),
            "/queue" => ReplInput::Usage("/queue <agent>"),
            "/recover" if !arg.is_empty() => ReplInput::Recover(arg.to_string()),
            "/recover" => ReplInput::Usage("/recover <agent>"),
            other => ReplInput::Unknown(other.to_string()),
        }
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    }
}

/// Wait until every mailbox is empty, polling every `poll`.
pub async fn wait_until_settled(router: &AgentRouter, poll: Duration) {
    loop {
        let busy = router.list_agents().iter().any(|agent| {
            router
                .get_message_queue(&agent.id)
                .map(|queue| !queue.is_empty())
                .unwrap_or(false)
        });
        if !busy {
            return;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    router: AgentRouter,
    default_agent: AgentId,
    history_file: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(router: AgentRouter) -> Self {
        Self {
            router,
            default_agent: AgentId::new("producer"),
            history_file: dirs::data_dir().map(|p| p.join("agent-crew").join("history.txt")),
        }
    }

    /// Set the history file; `None` keeps history in memory only
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Agent that receives lines without an `@agent` prefix
    pub fn with_default_agent(mut self, agent_id: AgentId) -> Self {
        self.default_agent = agent_id;
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_file else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Could not open history file {}: {}", path.display(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("crew".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            // Reading blocks; keep the runtime's other workers free for lanes.
            let signal = tokio::task::block_in_place(|| editor.read_line(&prompt))?;

            match signal {
                Signal::Success(line) => {
                    if !self.handle(ReplInput::parse(&line)).await {
                        break;
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            agent-crew - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Crew: {}",
            self.router
                .list_agents()
                .iter()
                .map(|a| a.id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "Lines without @agent go to {}.",
            self.default_agent.as_str().bold()
        );
        Self::print_help();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  @<agent> <text>   - Send a message to an agent");
        println!("  /status           - Show every agent's status");
        println!("  /queue <agent>    - Show an agent's pending messages");
        println!("  /recover <agent>  - Return an agent to idle");
        println!("  /help, /h, /?     - Show this help");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
    }

    /// Handle one input. Returns false when the REPL should exit.
    async fn handle(&self, input: ReplInput) -> bool {
        match input {
            ReplInput::Empty => {}
            ReplInput::Quit => {
                println!("Bye!");
                return false;
            }
            ReplInput::Help => Self::print_help(),
            ReplInput::Usage(usage) => println!("Usage: {}", usage),
            ReplInput::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
            ReplInput::Status => {
                print!(
                    "{}",
                    ConsoleFormatter::format_status_table(&self.router.list_agents())
                );
            }
            ReplInput::Queue(target) => match self.resolve(&target) {
                Ok(agent_id) => match self.router.get_message_queue(&agent_id) {
                    Ok(queue) => print!("{}", ConsoleFormatter::format_queue(&agent_id, &queue)),
                    Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
                },
                Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
            },
            ReplInput::Recover(target) => {
                match self
                    .resolve(&target)
                    .and_then(|agent_id| self.router.recover(&agent_id).map(|()| agent_id))
                {
                    Ok(agent_id) => println!("{} is idle", agent_id.as_str().bold()),
                    Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
                }
            }
            ReplInput::Send { agent, text } => {
                let target = match agent {
                    Some(target) => self.resolve(&target),
                    None => Ok(self.default_agent.clone()),
                };
                match target {
                    Ok(agent_id) => self.send(agent_id, text).await,
                    Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
                }
            }
        }
        true
    }

    fn resolve(&self, target: &str) -> Result<AgentId, RouterError> {
        self.router
            .resolve(target)
            .ok_or_else(|| RouterError::AgentNotFound(AgentId::new(target)))
    }

    async fn send(&self, agent_id: AgentId, text: String) {
        println!();
        let message = AgentMessage::from_user(agent_id.clone(), text);
        match self.router.send_message(&agent_id, message).await {
            Ok(response) => {
                let name = self
                    .router
                    .get_agent(&agent_id)
                    .map(|a| a.name)
                    .unwrap_or_else(|_| agent_id.to_string());
                println!("{}", ConsoleFormatter::format_response(&name, &response));
            }
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
    }
}
