//! Sliding-window call quota, keyed by `(capability_id, actor_id)`.
//!
//! The evaluator's check-and-record step must be one atomic unit per key:
//! two concurrent calls must never both observe "below ceiling" and both
//! proceed when only one should. [`QuotaStore::try_consume`] is that
//! primitive; production backends implement it with an atomic counter or a
//! transactional read-modify-write. The in-memory reference serializes all
//! three operations under one mutex.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Errors from quota store backends.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("quota store lock poisoned")]
    Poisoned,

    #[error("quota backend error: {0}")]
    Backend(String),
}

/// Outcome of an atomic check-and-record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaOutcome {
    /// The call was recorded. `used` includes this call.
    Granted { used: u64 },
    /// Ceiling reached; nothing was recorded. `retry_after` is the time
    /// until the oldest call in the window stops counting (always positive).
    Exhausted { retry_after: Duration },
}

/// Call counter contract.
///
/// A call recorded at time `T` counts toward any window whose end is `>= T`
/// and whose start is `<= T`, for the window length after `T`, and not
/// after.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Record one call at `at`.
    async fn record_call(
        &self,
        capability_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), QuotaError>;

    /// Count calls for the key in the trailing window ending at `as_of`.
    async fn count_calls(
        &self,
        capability_id: &str,
        actor_id: &str,
        as_of: DateTime<Utc>,
        window: Duration,
    ) -> Result<u64, QuotaError>;

    /// Atomically count and, when below `ceiling`, record one call. The
    /// evaluator only ever uses this entry point.
    async fn try_consume(
        &self,
        capability_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
        window: Duration,
        ceiling: u32,
    ) -> Result<QuotaOutcome, QuotaError>;
}

type QuotaKey = (String, String);

/// In-memory reference implementation: per-key timestamp lists, filtered on
/// each count. Acceptable for concurrent use because every operation runs
/// under one lock.
#[derive(Default)]
pub struct InMemoryQuotaStore {
    calls: Mutex<HashMap<QuotaKey, Vec<DateTime<Utc>>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<QuotaKey, Vec<DateTime<Utc>>>>, QuotaError> {
        self.calls.lock().map_err(|_| QuotaError::Poisoned)
    }

    fn in_window(ts: DateTime<Utc>, as_of: DateTime<Utc>, window: Duration) -> bool {
        ts <= as_of && ts >= as_of - window
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn record_call(
        &self,
        capability_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), QuotaError> {
        let mut calls = self.lock()?;
        let entry = calls
            .entry((capability_id.to_string(), actor_id.to_string()))
            .or_default();
        // Drop timestamps that can no longer count toward any window ending
        // at or after `at`.
        entry.retain(|ts| *ts >= at - Duration::hours(1));
        entry.push(at);
        Ok(())
    }

    async fn count_calls(
        &self,
        capability_id: &str,
        actor_id: &str,
        as_of: DateTime<Utc>,
        window: Duration,
    ) -> Result<u64, QuotaError> {
        let calls = self.lock()?;
        let count = calls
            .get(&(capability_id.to_string(), actor_id.to_string()))
            .map(|entry| {
                entry
                    .iter()
                    .filter(|ts| Self::in_window(**ts, as_of, window))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn try_consume(
        &self,
        capability_id: &str,
        actor_id: &str,
        at: DateTime<Utc>,
        window: Duration,
        ceiling: u32,
    ) -> Result<QuotaOutcome, QuotaError> {
        let mut calls = self.lock()?;
        let entry = calls
            .entry((capability_id.to_string(), actor_id.to_string()))
            .or_default();

        let in_window: Vec<DateTime<Utc>> = entry
            .iter()
            .copied()
            .filter(|ts| Self::in_window(*ts, at, window))
            .collect();

        if in_window.len() as u64 >= u64::from(ceiling) {
            let oldest = in_window.iter().min().copied().unwrap_or(at);
            let retry_after = (oldest + window - at).max(Duration::seconds(1));
            return Ok(QuotaOutcome::Exhausted { retry_after });
        }

        entry.retain(|ts| *ts >= at - window);
        entry.push(at);
        Ok(QuotaOutcome::Granted {
            used: in_window.len() as u64 + 1,
        })
    }
}
