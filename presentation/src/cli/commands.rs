//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for agent-crew
#[derive(Parser, Debug)]
#[command(name = "agent-crew")]
#[command(author, version, about = "A crew of role-playing agents that plan and build together")]
#[command(long_about = r#"
agent-crew runs a small team of language-model personas (Producer,
Architect, Engineer, QA). Each agent works through its own mailbox one
message at a time and may hand work to the others.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./crew.toml         Project-level config (or ./.crew.toml)
3. ~/.config/agent-crew/config.toml   Global config

Environment variables prefixed with CREW_ override file values
(e.g. CREW_CREW__MAX_AGENTS=6).

Example:
  agent-crew send --agent producer "Let's build a todo app"
  agent-crew status
  agent-crew chat
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Suppress progress indicators and event lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send one message to an agent and print its response
    Send {
        /// Agent id or role name (producer, architect, engineer, qa)
        #[arg(short, long, default_value = "producer")]
        agent: String,

        /// Message text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print every agent's status and statistics
    Status,

    /// Start the interactive chat
    Chat,
}

impl Command {
    /// The message text of a `send`, words joined by single spaces.
    pub fn message_text(&self) -> Option<String> {
        match self {
            Command::Send { text, .. } => Some(text.join(" ")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_joins_words() {
        let cli = Cli::parse_from(["agent-crew", "send", "--agent", "qa", "test", "the", "form"]);
        let command = cli.command.unwrap();
        assert_eq!(command.message_text().as_deref(), Some("test the form"));
        assert!(matches!(command, Command::Send { ref agent, .. } if agent == "qa"));
    }

    #[test]
    fn test_send_defaults_to_producer() {
        let cli = Cli::parse_from(["agent-crew", "send", "hello"]);
        assert!(matches!(cli.command, Some(Command::Send { ref agent, .. }) if agent == "producer"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["agent-crew", "status", "-vv", "--no-config"]);
        assert_eq!(cli.command, Some(Command::Status));
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
    }

    #[test]
    fn test_send_requires_text() {
        assert!(Cli::try_parse_from(["agent-crew", "send", "--agent", "qa"]).is_err());
    }
}
