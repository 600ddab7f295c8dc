//! JSONL file writer for domain events.
//!
//! Each [`DomainEvent`] is serialized as a single JSON line, appended to the
//! file via a buffered writer.

use crew_application::EventSink;
use crew_domain::DomainEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Event journal that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventJournal {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventJournal {
    /// Open `path` for appending.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event journal directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event journal {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventJournal {
    fn record(&self, event: &DomainEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush per line; the journal is append-only
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventJournal {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_application::{EventBus, EventFilter};
    use crew_domain::{AgentId, AgentStatus, AgentType, EventKind, EventPayload};
    use std::sync::Arc;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_journal_records_bus_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let journal = Arc::new(JsonlEventJournal::open(&path).unwrap());

        let bus = EventBus::new();
        bus.subscribe_sink(EventFilter::All, journal.clone());
        bus.publish(EventPayload::AgentCreated {
            agent_id: AgentId::new("qa"),
            agent_type: AgentType::Qa,
            name: "QA".into(),
        });
        bus.publish(EventPayload::StatusChanged {
            agent_id: AgentId::new("qa"),
            from: AgentStatus::Idle,
            to: AgentStatus::Thinking,
        });

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event_type"], "agent-created");
        assert_eq!(lines[0]["version"], 1);
        assert_eq!(lines[1]["payload"]["kind"], "status-changed");
        assert_eq!(lines[1]["payload"]["to"], "thinking");

        let event: DomainEvent = serde_json::from_value(lines[1].clone()).unwrap();
        assert_eq!(event.event_type, EventKind::StatusChanged);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let event = DomainEvent::new(
            1,
            EventPayload::Error {
                agent_id: None,
                message_id: None,
                error: "boom".into(),
            },
        );

        JsonlEventJournal::open(&path).unwrap().record(&event);
        JsonlEventJournal::open(&path).unwrap().record(&event);

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlEventJournal::open(dir.path()).is_none());
    }
}
