//! Event bus: synchronous publish/subscribe fan-out of domain events.
//!
//! The bus is a plain cloneable value; every clone shares the same
//! subscriber list and version counter. Handlers run on the publishing
//! task, in subscription order, outside any internal lock, so a handler may
//! itself subscribe, unsubscribe or query the router. A panicking handler is
//! logged and skipped; it never unwinds into the publisher.

use crate::ports::event_sink::EventSink;
use crew_domain::{DomainEvent, EventKind, EventPayload};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::{trace, warn};

/// Callback invoked for each matching event.
pub type EventHandler = Arc<dyn Fn(&DomainEvent) + Send + Sync>;

/// Which events a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kind(EventKind),
}

impl EventFilter {
    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind(k) => *k == kind,
        }
    }
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        EventFilter::Kind(kind)
    }
}

struct Subscriber {
    id: u64,
    filter: EventFilter,
    handler: EventHandler,
}

#[derive(Default)]
struct BusInner {
    next_version: AtomicU64,
    next_subscriber: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, filter: impl Into<EventFilter>, handler: F) -> Subscription
    where
        F: Fn(&DomainEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Subscriber {
                id,
                filter: filter.into(),
                handler: Arc::new(handler),
            });

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Subscribe an [`EventSink`] adapter.
    pub fn subscribe_sink(
        &self,
        filter: impl Into<EventFilter>,
        sink: Arc<dyn EventSink>,
    ) -> Subscription {
        self.subscribe(filter, move |event| sink.record(event))
    }

    /// Stamp `payload` with the next version and deliver it.
    pub fn publish(&self, payload: EventPayload) -> DomainEvent {
        let version = self.inner.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let event = DomainEvent::new(version, payload);

        let handlers: Vec<(u64, EventHandler)> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|s| s.filter.matches(event.event_type))
            .map(|s| (s.id, s.handler.clone()))
            .collect();

        trace!(
            event = %event.event_type,
            version = event.version,
            subscribers = handlers.len(),
            "Publishing event"
        );
        for (subscriber, handler) in handlers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                warn!(
                    subscriber,
                    event = %event.event_type,
                    version = event.version,
                    panic = panic_message(panic.as_ref()),
                    "Event handler panicked"
                );
            }
        }
        event
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Version of the most recently published event (0 before any).
    pub fn current_version(&self) -> u64 {
        self.inner.next_version.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("version", &self.current_version())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping it keeps the subscription alive; call
/// [`unsubscribe`](Self::unsubscribe) to remove the handler.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Remove the handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let mut subscribers = bus.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|s| s.id != self.id);
        subscribers.len() != before
    }
}
