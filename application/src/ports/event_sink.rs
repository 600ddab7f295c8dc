//! Port for structured event recording.
//!
//! An [`EventSink`] receives every domain event it was subscribed for. This
//! is separate from `tracing` diagnostics: sinks capture the full event
//! stream in a machine-readable form (JSONL journal, test recorders).

use crew_domain::DomainEvent;

/// Receives domain events from the bus.
///
/// `record` is synchronous and infallible; implementations swallow their
/// own I/O failures so the publishing lane is never disturbed.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &DomainEvent);
}

/// No-op implementation for tests and when recording is disabled.
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn record(&self, _event: &DomainEvent) {}
}
