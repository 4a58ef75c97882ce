//! Append-only audit event storage.
//!
//! The engine only needs two operations from its audit backend: append one
//! event, and list the most recent N. Production backends (a transactional
//! append-only table, a log service) implement the same trait; the reference
//! backends here are an in-memory vec for tests and a newline-delimited JSON
//! file for single-host deployments.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::AuditEvent;

/// Result type for event store operations.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors from event store backends.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("event store lock poisoned")]
    Poisoned,
}

/// The audit trail storage trait.
///
/// Implementations must be safe to share across concurrent evaluations.
/// Append must be durable before returning; a lost denial record is a
/// compliance gap, not a soft failure.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event to the trail.
    async fn append(&self, event: &AuditEvent) -> EventStoreResult<()>;

    /// List the `n` most recent events, oldest first.
    async fn list_recent(&self, n: usize) -> EventStoreResult<Vec<AuditEvent>>;
}

/// In-memory event store for tests.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events appended.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &AuditEvent) -> EventStoreResult<()> {
        let mut events = self.events.lock().map_err(|_| EventStoreError::Poisoned)?;
        events.push(event.clone());
        Ok(())
    }

    async fn list_recent(&self, n: usize) -> EventStoreResult<Vec<AuditEvent>> {
        let events = self.events.lock().map_err(|_| EventStoreError::Poisoned)?;
        let start = events.len().saturating_sub(n);
        Ok(events[start..].to_vec())
    }
}

/// Newline-delimited JSON file store, one event per line.
///
/// Appends are serialized under a mutex; `list_recent` re-reads the file so
/// it also sees events written by a previous process on the same host.
pub struct NdjsonEventStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl NdjsonEventStore {
    /// Open (or create) the trail file in append mode.
    pub fn open(path: impl AsRef<Path>) -> EventStoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventStore for NdjsonEventStore {
    async fn append(&self, event: &AuditEvent) -> EventStoreResult<()> {
        let json = serde_json::to_string(event)?;
        let mut file = self.file.lock().map_err(|_| EventStoreError::Poisoned)?;
        writeln!(file, "{}", json)?;
        file.flush()?;
        Ok(())
    }

    async fn list_recent(&self, n: usize) -> EventStoreResult<Vec<AuditEvent>> {
        let contents = std::fs::read_to_string(&self.path)?;
        let mut events = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    // Skip the line rather than truncating the whole listing.
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        %err,
                        "skipping malformed audit trail line"
                    );
                }
            }
        }
        let start = events.len().saturating_sub(n);
        Ok(events[start..].to_vec())
    }
}
