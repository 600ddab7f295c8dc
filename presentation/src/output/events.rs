//! Live console rendering of bus events.
//!
//! Each agent's [`NotificationSettings`] decide which lifecycle events reach
//! the console. Status changes feed the spinners when a [`ProgressReporter`]
//! is attached, and print as lines otherwise.

use crate::output::console::ConsoleFormatter;
use crate::progress::ProgressReporter;
use crew_application::{AgentRouter, CrewConfig, EventFilter, Subscription};
use crew_domain::{AgentId, DomainEvent, EventKind, EventPayload, NotificationSettings};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Whether an event of `kind` is surfaced under `settings`.
pub fn should_print(kind: EventKind, settings: &NotificationSettings) -> bool {
    match kind {
        EventKind::StatusChanged => settings.status_changes,
        EventKind::TaskCreated | EventKind::CoordinationRequested => settings.task_assignments,
        EventKind::ResponseReceived | EventKind::MilestoneCelebrated => settings.completions,
        EventKind::Error => settings.errors,
        EventKind::PlanUpdated
        | EventKind::ClarificationRequested
        | EventKind::DecisionRecorded
        | EventKind::IssueReported
        | EventKind::AgentCreated => true,
        // The operator already sees what was sent
        EventKind::MessageSent => false,
    }
}

pub struct EventPrinter {
    config: CrewConfig,
    notifications: RwLock<HashMap<AgentId, NotificationSettings>>,
    progress: Option<Arc<ProgressReporter>>,
}

impl EventPrinter {
    pub fn new(router: &AgentRouter) -> Self {
        let notifications = router
            .list_agents()
            .into_iter()
            .map(|agent| (agent.id, agent.config.notifications))
            .collect();
        Self {
            config: router.config().clone(),
            notifications: RwLock::new(notifications),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Subscribe to every event on the router's bus.
    pub fn attach(self, router: &AgentRouter) -> Subscription {
        let printer = Arc::new(self);
        router.subscribe(EventFilter::All, move |event| printer.handle(event))
    }

    fn settings_for(&self, agent_id: Option<&AgentId>) -> NotificationSettings {
        agent_id
            .and_then(|id| {
                self.notifications
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(id)
                    .copied()
            })
            .unwrap_or_default()
    }

    /// The line to print for `event`, if any. Status changes are routed to
    /// the spinners instead when progress is shown.
    pub fn render(&self, event: &DomainEvent) -> Option<String> {
        if let EventPayload::AgentCreated {
            agent_id,
            agent_type,
            ..
        } = &event.payload
        {
            self.notifications
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(agent_id.clone(), self.config.agent_config(*agent_type).notifications);
        }

        let settings = self.settings_for(event.payload.agent_id());
        if !should_print(event.event_type, &settings) {
            return None;
        }

        if let (Some(progress), EventPayload::StatusChanged { agent_id, to, .. }) =
            (&self.progress, &event.payload)
        {
            progress.on_status(agent_id, *to);
            return None;
        }

        Some(ConsoleFormatter::format_event(event))
    }

    fn handle(&self, event: &DomainEvent) {
        let Some(line) = self.render(event) else {
            return;
        };
        match &self.progress {
            Some(progress) => progress.println(&line),
            None => println!("{}", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crew_application::{GatewayError, GenerationOptions, ModelGateway};
    use crew_domain::{AgentConfiguration, AgentStatus, AgentType, Turn};

    struct SilentGateway;

    #[async_trait]
    impl ModelGateway for SilentGateway {
        async fn generate(
            &self,
            _turns: &[Turn],
            _options: &GenerationOptions,
        ) -> Result<String, GatewayError> {
            Ok("ok".into())
        }
    }

    fn quiet_qa() -> CrewConfig {
        let mut config = AgentConfiguration::default();
        config.notifications.status_changes = false;
        config.notifications.errors = false;
        CrewConfig::default().with_agent_config(AgentType::Qa, config)
    }

    fn status_changed(agent: &str) -> DomainEvent {
        DomainEvent::new(
            1,
            EventPayload::StatusChanged {
                agent_id: AgentId::new(agent),
                from: AgentStatus::Idle,
                to: AgentStatus::Thinking,
            },
        )
    }

    #[test]
    fn test_should_print_follows_settings() {
        let mut settings = NotificationSettings::default();
        assert!(should_print(EventKind::ResponseReceived, &settings));
        assert!(!should_print(EventKind::MessageSent, &settings));

        settings.completions = false;
        settings.task_assignments = false;
        assert!(!should_print(EventKind::ResponseReceived, &settings));
        assert!(!should_print(EventKind::MilestoneCelebrated, &settings));
        assert!(!should_print(EventKind::TaskCreated, &settings));
        assert!(should_print(EventKind::IssueReported, &settings));
    }

    #[tokio::test]
    async fn test_per_agent_settings() {
        colored::control::set_override(false);
        let router = AgentRouter::builder(Arc::new(SilentGateway))
            .config(quiet_qa())
            .build()
            .unwrap();
        let printer = EventPrinter::new(&router);

        assert!(printer.render(&status_changed("qa")).is_none());
        assert_eq!(
            printer.render(&status_changed("engineer")).as_deref(),
            Some("* engineer idle -> thinking")
        );

        let error = DomainEvent::new(
            2,
            EventPayload::Error {
                agent_id: Some(AgentId::new("qa")),
                message_id: None,
                error: "boom".into(),
            },
        );
        assert!(printer.render(&error).is_none());
        router.shutdown().await;
    }

    #[tokio::test]
    async fn test_spawned_agent_gets_type_settings() {
        let router = AgentRouter::builder(Arc::new(SilentGateway))
            .config(quiet_qa())
            .build()
            .unwrap();
        let printer = EventPrinter::new(&router);

        let created = DomainEvent::new(
            5,
            EventPayload::AgentCreated {
                agent_id: AgentId::new("qa-2"),
                agent_type: AgentType::Qa,
                name: "QA (qa-2)".into(),
            },
        );
        assert!(printer.render(&created).is_some());
        assert!(printer.render(&status_changed("qa-2")).is_none());
        router.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_changes_drive_spinners() {
        let router = AgentRouter::builder(Arc::new(SilentGateway))
            .build()
            .unwrap();
        let progress = Arc::new(ProgressReporter::hidden());
        let printer = EventPrinter::new(&router).with_progress(progress.clone());

        assert!(printer.render(&status_changed("producer")).is_none());
        assert_eq!(progress.active(), 1);
        router.shutdown().await;
    }
}
