//! Offline action queue
//!
//! Actions attempted while the device is offline are recorded here and
//! replayed, oldest first, when connectivity returns. A replay that fails is
//! kept for a later pass until it is older than the queue's `max_age`, after
//! which it is dropped with an error log line.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use lifeline_config::QueueConfig;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Replayable action
pub type QueuedInvoke = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An action waiting for connectivity
pub struct QueuedAction {
    id: Uuid,
    invoke: QueuedInvoke,
    enqueued_at: Instant,
    enqueued_at_utc: DateTime<Utc>,
}

impl QueuedAction {
    fn new(invoke: QueuedInvoke) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoke,
            enqueued_at: Instant::now(),
            enqueued_at_utc: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at_utc
    }

    /// Time spent in the queue so far
    pub fn age(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

impl std::fmt::Debug for QueuedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedAction")
            .field("id", &self.id)
            .field("enqueued_at", &self.enqueued_at_utc)
            .finish_non_exhaustive()
    }
}

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Actions that succeeded and were discarded
    pub replayed: usize,
    /// Failed actions kept for a later pass
    pub requeued: usize,
    /// Failed actions discarded for being older than `max_age`
    pub dropped: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.replayed + self.requeued + self.dropped
    }
}

/// Pending action as reported by [`OfflineQueue::snapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedActionInfo {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
}

/// FIFO queue of actions deferred while offline
pub struct OfflineQueue {
    actions: Mutex<VecDeque<QueuedAction>>,
    drain_guard: tokio::sync::Mutex<()>,
    max_age: Duration,
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineQueue {
    /// Failed replays older than this are dropped
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new() -> Self {
        Self::with_max_age(Self::DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            actions: Mutex::new(VecDeque::new()),
            drain_guard: tokio::sync::Mutex::new(()),
            max_age,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::with_max_age(config.max_age)
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Append an action to the tail of the queue
    pub fn add<F, Fut>(&self, invoke: F) -> Uuid
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.push(Arc::new(move || invoke().boxed()))
    }

    /// Append an already boxed action
    pub fn push(&self, invoke: QueuedInvoke) -> Uuid {
        let action = QueuedAction::new(invoke);
        let id = action.id;

        let pending = {
            let mut actions = self.actions.lock();
            actions.push_back(action);
            actions.len()
        };

        debug!("Queued offline action {} ({} pending)", id, pending);
        id
    }

    /// Replay every queued action once, in FIFO order
    ///
    /// Drain passes never overlap. Actions added while a pass is running wait
    /// for the next pass.
    pub async fn process_queue(&self) -> DrainReport {
        let _guard = self.drain_guard.lock().await;

        let captured = std::mem::take(&mut *self.actions.lock());
        let mut report = DrainReport::default();

        if captured.is_empty() {
            return report;
        }

        info!("Replaying {} queued offline actions", captured.len());

        for action in captured {
            match (action.invoke)().await {
                Ok(()) => {
                    debug!("Queued action {} replayed", action.id);
                    report.replayed += 1;
                }
                Err(e) => {
                    let age = action.age();
                    if age < self.max_age {
                        warn!(
                            "Queued action {} failed ({}); keeping it for the next pass",
                            action.id, e
                        );
                        self.actions.lock().push_back(action);
                        report.requeued += 1;
                    } else {
                        error!(
                            "Dropping queued action {} enqueued at {} after {:?}: {}",
                            action.id, action.enqueued_at_utc, age, e
                        );
                        report.dropped += 1;
                    }
                }
            }
        }

        info!(
            "Offline queue drained: {} replayed, {} requeued, {} dropped",
            report.replayed, report.requeued, report.dropped
        );
        report
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }

    /// Discard every pending action, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut actions = self.actions.lock();
        let count = actions.len();
        actions.clear();
        if count > 0 {
            info!("Cleared {} queued offline actions", count);
        }
        count
    }

    /// Pending actions in replay order
    pub fn snapshot(&self) -> Vec<QueuedActionInfo> {
        self.actions
            .lock()
            .iter()
            .map(|action| QueuedActionInfo {
                id: action.id,
                enqueued_at: action.enqueued_at_utc,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_empty_drain() {
        let queue = OfflineQueue::new();
        assert_eq!(queue.process_queue().await, DrainReport::default());
    }

    #[tokio::test]
    async fn test_successful_replay_empties_queue() {
        let queue = OfflineQueue::new();
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            queue.add(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            });
        }
        assert_eq!(queue.len(), 3);

        let report = queue.process_queue().await;
        assert_eq!(report.replayed, 3);
        assert_eq!(report.total(), 3);
        assert!(queue.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_replay_is_requeued_in_window() {
        let queue = OfflineQueue::new();
        queue.add(|| async { Err(anyhow!("still flaky")) });

        let report = queue.process_queue().await;
        assert_eq!(report.requeued, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_and_clear() {
        let queue = OfflineQueue::new();
        let first = queue.add(|| async { Ok(()) });
        let second = queue.add(|| async { Ok(()) });

        let ids: Vec<Uuid> = queue.snapshot().into_iter().map(|info| info.id).collect();
        assert_eq!(ids, vec![first, second]);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_from_config() {
        let queue = OfflineQueue::from_config(&QueueConfig {
            max_age: Duration::from_secs(60),
        });
        assert_eq!(queue.max_age(), Duration::from_secs(60));
        assert_eq!(OfflineQueue::new().max_age(), OfflineQueue::DEFAULT_MAX_AGE);
    }
}
