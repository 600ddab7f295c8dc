use super::*;
use crate::error::ActionExecutionError;
use crate::ports::confirmation::AutoApproveConfirmation;
use crate::ports::model_gateway::{GatewayError, GenerationOptions};
use crate::processor::handlers::{ActionContext, ActionHandler};
use async_trait::async_trait;
use crew_domain::{
    ActionKind, AgentAction, AgentConfiguration, EventKind, MessageKind, Participant, Turn,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Barrier, Notify, Semaphore};

fn is_analysis(turns: &[Turn]) -> bool {
    turns
        .last()
        .is_some_and(|t| t.text.contains("Analyze the incoming message"))
}

fn system_of(turns: &[Turn]) -> &str {
    turns.first().map(|t| t.text.as_str()).unwrap_or_default()
}

/// Answers every call synchronously from a closure.
struct FnGateway<F>(F);

#[async_trait]
impl<F> ModelGateway for FnGateway<F>
where
    F: Fn(&[Turn]) -> Result<String, GatewayError> + Send + Sync,
{
    async fn generate(
        &self,
        turns: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        (self.0)(turns)
    }
}

fn replying(reply: &'static str) -> Arc<dyn ModelGateway> {
    Arc::new(FnGateway(move |turns: &[Turn]| {
        Ok(if is_analysis(turns) { "noted" } else { reply }.to_string())
    }))
}

/// Blocks each analysis pass until a permit is released.
struct GatedGateway {
    gate: Arc<Semaphore>,
    calls: AtomicUsize,
}

#[async_trait]
impl ModelGateway for GatedGateway {
    async fn generate(
        &self,
        turns: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if is_analysis(turns) {
            self.gate
                .acquire()
                .await
                .map_err(|e| GatewayError::Other(e.to_string()))?
                .forget();
            return Ok("noted".into());
        }
        Ok("done".into())
    }
}

fn gated() -> (Arc<GatedGateway>, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    let gateway = Arc::new(GatedGateway {
        gate: gate.clone(),
        calls: AtomicUsize::new(0),
    });
    (gateway, gate)
}

fn router_with(gateway: Arc<dyn ModelGateway>) -> AgentRouter {
    AgentRouter::builder(gateway).build().unwrap()
}

fn record(router: &AgentRouter, filter: impl Into<EventFilter>) -> Arc<Mutex<Vec<DomainEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    router.subscribe(filter, move |e| sink.lock().unwrap().push(e.clone()));
    events
}

/// Notifies once `count` events of `kind` have been published.
fn notify_after(router: &AgentRouter, kind: EventKind, count: usize) -> Arc<Notify> {
    let notify = Arc::new(Notify::new());
    let seen = Arc::new(AtomicUsize::new(0));
    let signal = notify.clone();
    router.subscribe(kind, move |_| {
        if seen.fetch_add(1, Ordering::SeqCst) + 1 == count {
            signal.notify_one();
        }
    });
    notify
}

async fn wait_for_status(router: &AgentRouter, id: &AgentId, status: AgentStatus) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while router.get_status(id).unwrap() != status {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

fn id(s: &str) -> AgentId {
    AgentId::new(s)
}

fn transitions(events: &Mutex<Vec<DomainEvent>>, agent: &AgentId) -> Vec<(AgentStatus, AgentStatus)> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::StatusChanged { agent_id, from, to } if agent_id == agent => {
                Some((*from, *to))
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_default_team_is_idle() {
    let router = router_with(replying("hi"));
    let statuses = router.get_all_statuses();
    assert_eq!(statuses.len(), 4);
    assert!(statuses.values().all(|s| *s == AgentStatus::Idle));
    assert_eq!(router.list_agents()[0].agent_type, AgentType::Producer);
}

#[tokio::test]
async fn test_simple_exchange() {
    let router = router_with(replying("Happy to help. What should it do?"));
    let events = record(&router, EventFilter::All);
    let producer = id("producer");

    let response = router
        .send_message(&producer, AgentMessage::from_user("producer", "Hi, I need a todo app"))
        .await
        .unwrap();

    assert_eq!(response.agent_type, AgentType::Producer);
    assert_eq!(response.content, "Happy to help. What should it do?");
    assert!(response.errors.is_empty());
    assert!(response.actions.is_empty());
    assert_eq!(
        transitions(&events, &producer),
        vec![
            (AgentStatus::Idle, AgentStatus::Thinking),
            (AgentStatus::Thinking, AgentStatus::Idle)
        ]
    );
    assert_eq!(router.get_status(&producer).unwrap(), AgentStatus::Idle);

    let agent = router.get_agent(&producer).unwrap();
    assert_eq!(agent.stats.messages_processed, 1);
    assert_eq!(agent.stats.error_count, 0);

    let kinds: Vec<_> = events.lock().unwrap().iter().map(|e| e.event_type).collect();
    assert_eq!(kinds.first(), Some(&EventKind::MessageSent));
    assert_eq!(kinds.last(), Some(&EventKind::ResponseReceived));
}

#[tokio::test]
async fn test_error_state_rejects_before_any_work() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = router_with(Arc::new(FnGateway(move |_: &[Turn]| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok("unused".to_string())
    })));
    let producer = id("producer");
    router.attempt_transition(&producer, AgentStatus::Error).unwrap();
    let events = record(&router, EventFilter::All);

    let result = router
        .send_message(&producer, AgentMessage::from_user("producer", "Anyone there?"))
        .await;

    assert_eq!(result.unwrap_err(), RouterError::AgentInErrorState(producer.clone()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(events.lock().unwrap().is_empty());
    assert!(router.get_message_queue(&producer).unwrap().is_empty());
}

#[tokio::test]
async fn test_coordination_reaches_target_once() {
    let gateway = FnGateway(|turns: &[Turn]| {
        if is_analysis(turns) {
            return Ok("noted".to_string());
        }
        if system_of(turns).contains("Producer of") {
            Ok(r#"Let me loop in the architect.
```actions
[{"type": "coordinate-with-agent", "params": {"target": "architect", "request": "Draft the data model"}}]
```"#
                .to_string())
        } else {
            Ok("Data model drafted.".to_string())
        }
    });
    let router = router_with(Arc::new(gateway));
    let events = record(&router, EventFilter::All);
    let architect_done = notify_after(&router, EventKind::ResponseReceived, 2);

    let response = router
        .send_message(&id("producer"), AgentMessage::from_user("producer", "Plan the backend"))
        .await
        .unwrap();
    assert_eq!(response.actions.len(), 1);
    assert_eq!(response.executed_count(), 1);

    tokio::time::timeout(Duration::from_secs(5), architect_done.notified())
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let to_architect: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::MessageSent { agent_id, sender, .. } if agent_id.as_str() == "architect" => {
                Some(sender.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(to_architect, vec![Participant::Agent(id("producer"))]);

    let requested: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventKind::CoordinationRequested)
        .collect();
    assert_eq!(requested.len(), 1);
    assert!(matches!(
        &requested[0].payload,
        EventPayload::CoordinationRequested { to, depth: 1, .. } if to.as_str() == "architect"
    ));
}

#[tokio::test]
async fn test_fifo_per_agent() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let seen = order.clone();
    let router = router_with(Arc::new(FnGateway(move |turns: &[Turn]| {
        if is_analysis(turns) {
            return Ok("noted".to_string());
        }
        let prompt = &turns[turns.len() - 1].text;
        if let Some(job) = (1..=5).find(|i| prompt.contains(&format!("job-{i}"))) {
            seen.lock().unwrap().push(job);
        }
        Ok("ok".to_string())
    })));
    let engineer = id("engineer");

    for i in 1..=4 {
        router
            .post(&engineer, AgentMessage::from_user("engineer", format!("job-{i}")))
            .unwrap();
    }
    router
        .send_message(&engineer, AgentMessage::from_user("engineer", "job-5"))
        .await
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert!(router.get_message_queue(&engineer).unwrap().is_empty());
}

/// Tracks how many calls run at once.
struct ConcurrencyGateway {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ModelGateway for ConcurrencyGateway {
    async fn generate(
        &self,
        _turns: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<String, GatewayError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok("ok".into())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_message_in_flight_per_agent() {
    let gateway = Arc::new(ConcurrencyGateway {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let router = router_with(gateway.clone());
    let qa = id("qa");

    let sends = (0..4).map(|i| {
        router.send_message(&qa, AgentMessage::from_user("qa", format!("check {i}")))
    });
    for result in futures::future::join_all(sends).await {
        result.unwrap();
    }

    assert_eq!(gateway.peak.load(Ordering::SeqCst), 1);
    assert_eq!(router.get_agent(&qa).unwrap().stats.messages_processed, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_agents_run_concurrently() {
    // Each analysis pass waits for the other agent's, so this only
    // completes if both lanes are active at the same time.
    let barrier = Arc::new(Barrier::new(2));
    struct BarrierGateway(Arc<Barrier>);

    #[async_trait]
    impl ModelGateway for BarrierGateway {
        async fn generate(
            &self,
            turns: &[Turn],
            _options: &GenerationOptions,
        ) -> Result<String, GatewayError> {
            if is_analysis(turns) {
                self.0.wait().await;
            }
            Ok("ok".into())
        }
    }

    let router = router_with(Arc::new(BarrierGateway(barrier)));
    let (a, b) = tokio::time::timeout(
        Duration::from_secs(5),
        futures::future::join(
            router.send_message(&id("architect"), AgentMessage::from_user("architect", "a")),
            router.send_message(&id("engineer"), AgentMessage::from_user("engineer", "b")),
        ),
    )
    .await
    .unwrap();
    a.unwrap();
    b.unwrap();
}

#[tokio::test]
async fn test_queue_snapshot_keeps_messages_intact() {
    let (gateway, gate) = gated();
    let router = router_with(gateway);
    let architect = id("architect");

    let first = AgentMessage::from_user("architect", "Design the API").with_thread("proj-1");
    let second = AgentMessage::from_user("architect", "And the schema")
        .with_kind(MessageKind::Notification);
    router.post(&architect, first.clone()).unwrap();
    wait_for_status(&router, &architect, AgentStatus::Thinking).await;
    router.post(&architect, second.clone()).unwrap();

    let queue = router.get_message_queue(&architect).unwrap();
    assert_eq!(queue, vec![first, second]);

    let done = notify_after(&router, EventKind::ResponseReceived, 2);
    gate.add_permits(2);
    tokio::time::timeout(Duration::from_secs(5), done.notified())
        .await
        .unwrap();
    wait_for_status(&router, &architect, AgentStatus::Idle).await;
    assert!(router.get_message_queue(&architect).unwrap().is_empty());
}

struct FailingHandler;

#[async_trait]
impl ActionHandler for FailingHandler {
    async fn handle(
        &self,
        _action: &AgentAction,
        _ctx: &ActionContext,
    ) -> Result<String, ActionExecutionError> {
        Err(ActionExecutionError::Failed("tracker unavailable".into()))
    }
}

#[tokio::test]
async fn test_partial_action_failure() {
    let processor = ResponseProcessor::new(Arc::new(AutoApproveConfirmation))
        .with_handler(ActionKind::CreateTask, Arc::new(FailingHandler));
    let router = AgentRouter::builder(replying(
        r#"Kicking off.
```actions
[
  {"type": "update-plan", "params": {"summary": "MVP", "steps": ["api", "ui"]}},
  {"type": "create-task", "params": {"title": "Set up CI"}},
  {"type": "celebrate-milestone", "params": {"milestone": "Kickoff"}}
]
```"#,
    ))
    .processor(processor)
    .build()
    .unwrap();
    let events = record(&router, EventFilter::All);
    let producer = id("producer");

    let response = router
        .send_message(&producer, AgentMessage::from_user("producer", "Start the project"))
        .await
        .unwrap();

    assert_eq!(response.content, "Kicking off.");
    assert_eq!(response.actions.len(), 3);
    assert_eq!(response.executed_count(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].action_index(), Some(1));
    assert_eq!(
        transitions(&events, &producer),
        vec![
            (AgentStatus::Idle, AgentStatus::Thinking),
            (AgentStatus::Thinking, AgentStatus::Working),
            (AgentStatus::Working, AgentStatus::Idle)
        ]
    );
    assert_eq!(router.plans().get(&producer).unwrap().summary, "MVP");
    assert_eq!(router.get_agent(&producer).unwrap().stats.tasks_completed, 2);
}

#[tokio::test]
async fn test_waiting_directive_is_honored() {
    let router = router_with(replying(
        "Which platform?\n```actions\n{\"status\": \"waiting\", \"actions\": []}\n```",
    ));
    let producer = id("producer");

    let response = router
        .send_message(&producer, AgentMessage::from_user("producer", "Build an app"))
        .await
        .unwrap();
    assert_eq!(response.status_update, Some(AgentStatus::Waiting));
    assert_eq!(router.get_status(&producer).unwrap(), AgentStatus::Waiting);

    // A waiting agent still accepts the answer.
    router
        .send_message(&producer, AgentMessage::from_user("producer", "Web"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_busy_directive_falls_back_to_idle() {
    let router = router_with(replying("On it.\n```actions\n{\"status\": \"working\", \"actions\": []}\n```"));
    let engineer = id("engineer");

    let response = router
        .send_message(&engineer, AgentMessage::from_user("engineer", "Build it"))
        .await
        .unwrap();
    assert_eq!(response.errors.len(), 1);
    assert_eq!(router.get_status(&engineer).unwrap(), AgentStatus::Idle);
}

#[tokio::test]
async fn test_provider_failure_enters_error() {
    let router = router_with(Arc::new(FnGateway(|_: &[Turn]| {
        Err(GatewayError::RequestFailed("502 from upstream".into()))
    })));
    let errors = record(&router, EventKind::Error);
    let qa = id("qa");
    let message = AgentMessage::from_user("qa", "Run the suite");
    let message_id = message.id.clone();

    let result = router.send_message(&qa, message).await;
    assert!(result.as_ref().unwrap_err().is_provider_error());
    assert_eq!(router.get_status(&qa).unwrap(), AgentStatus::Error);
    assert_eq!(router.get_agent(&qa).unwrap().stats.error_count, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0].payload,
        EventPayload::Error { message_id: Some(m), .. } if *m == message_id
    ));
    drop(errors);

    let again = router
        .send_message(&qa, AgentMessage::from_user("qa", "Retry"))
        .await;
    assert_eq!(again.unwrap_err(), RouterError::AgentInErrorState(qa.clone()));

    router.recover(&qa).unwrap();
    assert_eq!(router.get_status(&qa).unwrap(), AgentStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_enters_error() {
    struct SlowGateway;

    #[async_trait]
    impl ModelGateway for SlowGateway {
        async fn generate(
            &self,
            _turns: &[Turn],
            _options: &GenerationOptions,
        ) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    let config = CrewConfig::default().with_agent_config(
        AgentType::Engineer,
        AgentConfiguration::default().with_timeout_seconds(2),
    );
    let router = AgentRouter::builder(Arc::new(SlowGateway))
        .config(config)
        .build()
        .unwrap();
    let engineer = id("engineer");

    let result = router
        .send_message(&engineer, AgentMessage::from_user("engineer", "Compile everything"))
        .await;
    assert_eq!(
        result.unwrap_err(),
        RouterError::ProviderError(GatewayError::Timeout(Duration::from_secs(2)))
    );
    assert_eq!(router.get_status(&engineer).unwrap(), AgentStatus::Error);
}

#[tokio::test]
async fn test_coordination_depth_is_bounded() {
    // Architect and engineer keep handing the work back to each other.
    let router = router_with(Arc::new(FnGateway(|turns: &[Turn]| {
        if is_analysis(turns) {
            return Ok("noted".to_string());
        }
        let target = if system_of(turns).contains("Architect of") {
            "engineer"
        } else {
            "architect"
        };
        Ok(format!(
            "Over to {target}.\n```actions\n[{{\"type\": \"coordinate-with-agent\", \"params\": {{\"target\": \"{target}\", \"request\": \"your turn\"}}}}]\n```"
        ))
    })));
    let responses = record(&router, EventKind::ResponseReceived);
    let requests = record(&router, EventKind::CoordinationRequested);
    let settled = notify_after(&router, EventKind::ResponseReceived, 4);

    router
        .send_message(&id("engineer"), AgentMessage::from_user("engineer", "Build the API"))
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), settled.notified())
        .await
        .unwrap();

    // Depths 1, 2 and 3 are accepted; the hop to depth 4 is refused.
    assert_eq!(requests.lock().unwrap().len(), 3);
    let responses = responses.lock().unwrap();
    assert_eq!(responses.len(), 4);
    assert!(matches!(
        responses[3].payload,
        EventPayload::ResponseReceived { error_count: 1, .. }
    ));
}

#[tokio::test]
async fn test_depth_checked_on_admission() {
    let router = router_with(replying("ok"));
    let qa = id("qa");
    let message = AgentMessage::new(id("engineer"), qa.clone(), "ping", MessageKind::Request)
        .with_coordination_depth(4);

    assert_eq!(
        router.post(&qa, message).unwrap_err(),
        RouterError::CoordinationDepthExceeded { depth: 4, max: 3 }
    );
    assert!(router.get_message_queue(&qa).unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_agent() {
    let router = router_with(replying("ok"));
    let ghost = id("ghost");
    assert_eq!(
        router
            .send_message(&ghost, AgentMessage::from_user("ghost", "hello"))
            .await
            .unwrap_err(),
        RouterError::AgentNotFound(ghost.clone())
    );
    assert_eq!(
        router.get_status(&ghost).unwrap_err(),
        RouterError::AgentNotFound(ghost.clone())
    );
    assert!(router.get_message_queue(&ghost).is_err());
}

#[tokio::test]
async fn test_spawn_until_full() {
    let router = router_with(replying("ok"));
    let created = record(&router, EventKind::AgentCreated);

    let second = router.spawn_agent(AgentType::Engineer, None).unwrap();
    assert_eq!(second.as_str(), "engineer-2");
    assert_eq!(router.get_agent(&second).unwrap().name, "Engineer (engineer-2)");

    let named = router
        .spawn_agent(AgentType::Qa, Some("Quinn".into()))
        .unwrap();
    assert_eq!(router.get_agent(&named).unwrap().name, "Quinn");

    router.spawn_agent(AgentType::Engineer, None).unwrap();
    router.spawn_agent(AgentType::Architect, None).unwrap();
    assert_eq!(
        router.spawn_agent(AgentType::Engineer, None).unwrap_err(),
        RouterError::RegistryFull { max: 8 }
    );
    assert_eq!(created.lock().unwrap().len(), 4);

    router
        .send_message(&second, AgentMessage::from_user(second.clone(), "hello"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_offline_and_recover() {
    let router = router_with(replying("ok"));
    let architect = id("architect");

    router.take_offline(&architect).unwrap();
    assert_eq!(
        router
            .send_message(&architect, AgentMessage::from_user("architect", "hi"))
            .await
            .unwrap_err(),
        RouterError::InvalidTransition {
            from: AgentStatus::Offline,
            to: AgentStatus::Thinking
        }
    );

    router.recover(&architect).unwrap();
    router.recover(&architect).unwrap();
    assert_eq!(router.get_status(&architect).unwrap(), AgentStatus::Idle);

    router.attempt_transition(&architect, AgentStatus::Thinking).unwrap();
    assert_eq!(
        router.recover(&architect).unwrap_err(),
        RouterError::InvalidTransition {
            from: AgentStatus::Thinking,
            to: AgentStatus::Idle
        }
    );
    assert!(router.take_offline(&architect).is_err());
}

#[tokio::test]
async fn test_refused_messages_are_not_announced() {
    let router = router_with(replying("ok"));
    let sent = record(&router, EventKind::MessageSent);
    let architect = id("architect");

    router.take_offline(&architect).unwrap();
    assert!(router
        .post(&architect, AgentMessage::from_user("architect", "hi"))
        .is_err());
    assert!(router.get_message_queue(&architect).unwrap().is_empty());
    assert!(sent.lock().unwrap().is_empty());

    router.recover(&architect).unwrap();
    router
        .send_message(&architect, AgentMessage::from_user("architect", "hi again"))
        .await
        .unwrap();
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_panicking_subscriber_leaves_lane_running() {
    let router = router_with(replying("ok"));
    let qa = id("qa");
    let panicked = Arc::new(AtomicBool::new(false));
    let flag = panicked.clone();
    router.subscribe(EventKind::StatusChanged, move |_| {
        if !flag.swap(true, Ordering::SeqCst) {
            panic!("status subscriber failed");
        }
    });

    router
        .send_message(&qa, AgentMessage::from_user("qa", "test the login form"))
        .await
        .unwrap();
    assert!(panicked.load(Ordering::SeqCst));
    assert_eq!(router.get_status(&qa).unwrap(), AgentStatus::Idle);

    router
        .send_message(&qa, AgentMessage::from_user("qa", "and the signup form"))
        .await
        .unwrap();
    assert_eq!(router.get_agent(&qa).unwrap().stats.messages_processed, 2);
}

#[tokio::test]
async fn test_shutdown_closes_lanes() {
    let (gateway, gate) = gated();
    let router = router_with(gateway);
    let engineer = id("engineer");

    let in_flight = tokio::spawn({
        let router = router.clone();
        let engineer = engineer.clone();
        async move {
            router
                .send_message(&engineer, AgentMessage::from_user("engineer", "first"))
                .await
        }
    });
    wait_for_status(&router, &engineer, AgentStatus::Thinking).await;

    let queued = tokio::spawn({
        let router = router.clone();
        let engineer = engineer.clone();
        async move {
            router
                .send_message(&engineer, AgentMessage::from_user("engineer", "second"))
                .await
        }
    });
    tokio::time::timeout(Duration::from_secs(5), async {
        while router.get_message_queue(&engineer).unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    tokio::join!(router.shutdown(), async { gate.add_permits(2) });

    assert!(in_flight.await.unwrap().is_ok());
    assert_eq!(
        queued.await.unwrap().unwrap_err(),
        RouterError::LaneClosed(engineer.clone())
    );
    assert_eq!(
        router.post(&engineer, AgentMessage::from_user("engineer", "third")).unwrap_err(),
        RouterError::LaneClosed(engineer.clone())
    );
    // Statuses stay readable after shutdown.
    assert_eq!(router.get_status(&engineer).unwrap(), AgentStatus::Idle);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let result = AgentRouter::builder(replying("ok"))
        .config(CrewConfig::default().with_max_agents(2))
        .build();
    assert!(matches!(result, Err(RouterError::ConfigurationError(_))));
}

#[tokio::test]
async fn test_clarifying_question_answered_by_operator() {
    let router = router_with(Arc::new(FnGateway(|turns: &[Turn]| {
        if is_analysis(turns) {
            return Ok("noted".to_string());
        }
        let prompt = &turns[turns.len() - 1].text;
        if prompt.contains("Web or mobile?") {
            Ok("Web it is.".to_string())
        } else {
            Ok(r#"Quick question.
```actions
[{"type": "ask-clarifying-question", "params": {"question": "Web or mobile?", "options": ["web", "mobile"]}}]
```"#
                .to_string())
        }
    })));
    let questions = record(&router, EventKind::ClarificationRequested);
    let producer = id("producer");

    router
        .send_message(&producer, AgentMessage::from_user("producer", "Build an app"))
        .await
        .unwrap();
    assert_eq!(questions.lock().unwrap().len(), 1);

    // The open question reaches the next prompt, then is cleared.
    let reply = router
        .send_message(&producer, AgentMessage::from_user("producer", "web"))
        .await
        .unwrap();
    assert_eq!(reply.content, "Web it is.");

    let third = router
        .send_message(&producer, AgentMessage::from_user("producer", "thanks"))
        .await
        .unwrap();
    assert_eq!(third.content, "Quick question.");
}
