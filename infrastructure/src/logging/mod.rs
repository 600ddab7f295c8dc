//! Logging infrastructure: structured event journaling.
//!
//! Provides [`JsonlEventJournal`], a JSONL file writer that implements
//! the [`EventSink`](crew_application::EventSink) port.

mod jsonl_journal;

pub use jsonl_journal::JsonlEventJournal;
