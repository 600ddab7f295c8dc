//! In-process memory store.
//!
//! Entries live for the lifetime of the process. Search ranks entries by
//! how many distinct query words they contain, newest first on ties.

use async_trait::async_trait;
use crew_application::{MemoryEntry, MemoryError, MemoryPort};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;

/// Words shorter than this are ignored when matching.
const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    entries: RwLock<Vec<MemoryEntry>>,
    capacity: Option<usize>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries, dropping the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl MemoryPort for InMemoryMemoryStore {
    async fn store(&self, entry: MemoryEntry) -> Result<(), MemoryError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        debug!(agent = %entry.agent_id, kind = entry.kind.as_str(), "Memory stored");
        entries.push(entry);
        if let Some(capacity) = self.capacity
            && entries.len() > capacity
        {
            let excess = entries.len() - capacity;
            entries.drain(..excess);
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        let query = words(query);
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut scored: Vec<(usize, usize, &MemoryEntry)> = entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                let score = words(&entry.content).intersection(&query).count();
                (score > 0).then_some((score, position, entry))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, entry)| entry.clone())
            .collect())
    }
}
