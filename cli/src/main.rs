//! CLI entrypoint for agent-crew
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use crew_application::{
    AgentRouter, AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationPort, EventBus,
    EventFilter,
};
use crew_domain::AgentMessage;
use crew_infrastructure::{
    ConfigLoader, ConfirmationMode, FileConfig, InMemoryMemoryStore, JsonlEventJournal,
    ProcessModelGateway,
};
use crew_presentation::{
    ChatRepl, Cli, Command, ConsoleFormatter, EventPrinter, ProgressReporter, wait_until_settled,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const SETTLE_POLL: Duration = Duration::from_millis(100);

/// Initialize logging based on verbosity level. The returned guard flushes
/// the log file on drop.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let Some(file_name) = path.file_name() else {
        bail!("--log-file must name a file: {}", path.display());
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("Failed to load configuration: {e}"))
}

fn build_router(config: &FileConfig, command: &Command) -> Result<AgentRouter> {
    let crew_config = config.to_crew_config()?;

    // `status` never calls the model, so it works without one configured.
    let gateway = match (command, config.model.command()) {
        (_, Ok(program)) => ProcessModelGateway::new(program, config.model.args.clone()),
        (Command::Status, Err(_)) => ProcessModelGateway::new("", Vec::new()),
        (_, Err(e)) => bail!("{e}. Set [model] command in crew.toml or CREW_MODEL__COMMAND."),
    };

    let confirmation: Arc<dyn ConfirmationPort> = match config.confirmation.parse_mode()? {
        ConfirmationMode::AutoApprove => Arc::new(AutoApproveConfirmation),
        ConfirmationMode::AutoDecline => Arc::new(AutoDeclineConfirmation),
    };

    let bus = EventBus::new();
    if let Some(path) = &config.journal.path {
        match JsonlEventJournal::open(path) {
            Some(journal) => {
                info!("Journaling events to {}", journal.path().display());
                bus.subscribe_sink(EventFilter::All, Arc::new(journal));
            }
            None => warn!("Event journal disabled"),
        }
    }

    Ok(AgentRouter::builder(Arc::new(gateway))
        .config(crew_config)
        .bus(bus)
        .memory(Arc::new(InMemoryMemoryStore::new()))
        .confirmation(confirmation)
        .build()?)
}

async fn send(router: &AgentRouter, agent: &str, text: String) -> Result<()> {
    let Some(agent_id) = router.resolve(agent) else {
        bail!("Unknown agent: {agent}");
    };

    let message = AgentMessage::from_user(agent_id.clone(), text);
    let response = router.send_message(&agent_id, message).await?;
    let name = router.get_agent(&agent_id)?.name;
    println!("{}", ConsoleFormatter::format_response(&name, &response));

    // Let any coordination the reply started run to completion.
    wait_until_settled(router, SETTLE_POLL).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = load_config(&cli)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    let command = cli.command.clone().unwrap_or(Command::Chat);
    info!("Starting agent-crew");

    // === Dependency Injection ===
    let router = build_router(&config, &command)?;

    let progress = (!cli.quiet && config.repl.show_progress).then(|| Arc::new(ProgressReporter::new()));
    if !cli.quiet && config.output.show_events {
        let mut printer = EventPrinter::new(&router);
        if let Some(progress) = &progress {
            printer = printer.with_progress(progress.clone());
        }
        printer.attach(&router);
    }

    let result = match &command {
        Command::Status => {
            print!(
                "{}",
                ConsoleFormatter::format_status_table(&router.list_agents())
            );
            Ok(())
        }
        Command::Send { agent, .. } => {
            let text = command.message_text().unwrap_or_default();
            send(&router, agent, text).await
        }
        Command::Chat => {
            let mut repl = ChatRepl::new(router.clone());
            if let Some(path) = &config.repl.history_file {
                repl = repl.with_history_file(Some(path.clone()));
            }
            repl.run().await.map_err(Into::into)
        }
    };

    router.shutdown().await;
    if let Some(progress) = &progress {
        progress.clear();
    }
    result
}
