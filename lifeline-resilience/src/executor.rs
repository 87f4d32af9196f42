//! Resilient execution of network-dependent actions

use lifeline_caching::{CacheOptions, ResultCache};
use lifeline_core::{error_message, AppError, ErrorKind};
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::connectivity::ConnectivityMonitor;
use crate::queue::OfflineQueue;
use crate::retry::{ExecutionConfig, Retryable};

/// Message of the error returned when an offline call was queued
pub const QUEUED_MESSAGE: &str = "No internet connection. Action queued for later.";

/// Message of the error returned when an offline call was not queued
pub const OFFLINE_MESSAGE: &str = "No internet connection";

/// Why a resilient call did not produce a value
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The device was offline; the action was queued for replay
    #[error("{error}")]
    Queued {
        error: AppError,
        action_id: Uuid,
        attempts: u32,
    },

    /// The device was offline and queuing was disabled
    #[error("{error}")]
    Offline { error: AppError, attempts: u32 },

    /// The action itself failed
    #[error("{error}")]
    Failed {
        attempts: u32,
        #[source]
        error: anyhow::Error,
    },
}

impl ExecutionError {
    pub fn is_queued(&self) -> bool {
        matches!(self, ExecutionError::Queued { .. })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ExecutionError::Offline { .. })
    }

    /// Id of the queued action, if the call was queued
    pub fn action_id(&self) -> Option<Uuid> {
        match self {
            ExecutionError::Queued { action_id, .. } => Some(*action_id),
            _ => None,
        }
    }

    /// Number of times the action ran before the call gave up
    ///
    /// A call that went offline between retries reports the attempts that
    /// failed before connectivity was lost.
    pub fn attempts(&self) -> u32 {
        match self {
            ExecutionError::Queued { attempts, .. }
            | ExecutionError::Offline { attempts, .. }
            | ExecutionError::Failed { attempts, .. } => *attempts,
        }
    }

    /// Taxonomy view of the failure
    pub fn app_error(&self) -> AppError {
        match self {
            ExecutionError::Queued { error, .. } | ExecutionError::Offline { error, .. } => error.clone(),
            ExecutionError::Failed { error, .. } => AppError::classify(error),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.app_error().kind()
    }

    pub fn is_retryable(&self) -> bool {
        self.app_error().is_retryable()
    }

    /// Message safe to show to a user
    pub fn user_message(&self) -> String {
        match self {
            ExecutionError::Queued { error, .. } | ExecutionError::Offline { error, .. } => {
                error.message().to_string()
            }
            ExecutionError::Failed { error, .. } => {
                match error.chain().find_map(|cause| cause.downcast_ref::<AppError>()) {
                    Some(app_error) => app_error.message().to_string(),
                    None => error_message(error.as_ref()),
                }
            }
        }
    }

    /// The original error, unchanged for failed actions
    pub fn into_inner(self) -> anyhow::Error {
        match self {
            ExecutionError::Queued { error, .. } | ExecutionError::Offline { error, .. } => {
                anyhow::Error::new(error)
            }
            ExecutionError::Failed { error, .. } => error,
        }
    }
}

/// Connectivity-aware retrying executor
#[derive(Clone)]
pub struct ResilientExecutor {
    monitor: Arc<ConnectivityMonitor>,
    queue: Arc<OfflineQueue>,
    cache: Arc<ResultCache>,
    config: ExecutionConfig,
}

impl ResilientExecutor {
    pub fn new(
        monitor: Arc<ConnectivityMonitor>,
        queue: Arc<OfflineQueue>,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            monitor,
            queue,
            cache,
            config: ExecutionConfig::default(),
        }
    }

    /// Replace the policy used by [`ResilientExecutor::run`]
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Run an action with the executor's default policy
    pub async fn run<T, F, Fut>(&self, action: F) -> Result<T, ExecutionError>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.with_error_handling(action, &self.config).await
    }

    /// Run an action with connectivity checks, retries and offline queuing
    ///
    /// Connectivity is probed before every attempt. When offline the call
    /// fails at once, after queuing the action if `offline_queue` is set.
    /// Non-retryable failures are returned after the first attempt; other
    /// failures are retried with backoff until `max_retries` attempts ran.
    pub async fn with_error_handling<T, F, Fut>(
        &self,
        action: F,
        config: &ExecutionConfig,
    ) -> Result<T, ExecutionError>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let action = Arc::new(action);
        let mut attempts = 0u32;

        loop {
            if !self.monitor.fetch_current().await {
                return Err(self.defer(&action, config, attempts));
            }

            match (*action)().await {
                Ok(value) => {
                    if attempts > 0 {
                        info!("Action succeeded after {} attempts", attempts + 1);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    attempts += 1;

                    if !error.is_retryable() {
                        warn!("Action failed with non-retryable error: {}", error);
                        return Err(ExecutionError::Failed { attempts, error });
                    }

                    if !config.should_retry(attempts) {
                        warn!("Action failed after {} attempts: {}", attempts, error);
                        return Err(ExecutionError::Failed { attempts, error });
                    }

                    let delay = config.delay_for_attempt(attempts);
                    warn!(
                        "Attempt {} failed: {}. Retrying in {:?}",
                        attempts, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn defer<T, F, Fut>(
        &self,
        action: &Arc<F>,
        config: &ExecutionConfig,
        attempts: u32,
    ) -> ExecutionError
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        if !config.offline_queue {
            debug!("Offline and queuing disabled, failing call");
            return ExecutionError::Offline {
                error: AppError::network(OFFLINE_MESSAGE),
                attempts,
            };
        }

        let replay = Arc::clone(action);
        let action_id = self.queue.add(move || {
            let attempt = (*replay)();
            async move { attempt.await.map(|_| ()) }
        });

        info!("Offline, queued action {} for later", action_id);
        ExecutionError::Queued {
            error: AppError::network(QUEUED_MESSAGE),
            action_id,
            attempts,
        }
    }

    /// Serve from the result cache or fetch and populate
    pub async fn with_cache<T, E, F, Fut>(&self, fetch: F, options: &CacheOptions) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache.with_cache(fetch, options).await
    }

    /// Cached resilient call
    ///
    /// A cache hit skips connectivity checks and the action entirely. Only
    /// successful results are cached.
    pub async fn cached<T, F, Fut>(
        &self,
        key: impl Into<String>,
        ttl: Duration,
        action: F,
        config: &ExecutionConfig,
    ) -> Result<T, ExecutionError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let options = CacheOptions::new(key, ttl);
        self.cache
            .with_cache(move || self.with_error_handling(action, config), &options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ManualConnectivity;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor(connected: bool) -> (Arc<ManualConnectivity>, ResilientExecutor) {
        let source = Arc::new(ManualConnectivity::new(connected));
        let queue = Arc::new(OfflineQueue::new());
        let monitor = Arc::new(ConnectivityMonitor::new(source.clone(), queue.clone()));
        let executor = ResilientExecutor::new(monitor, queue, Arc::new(ResultCache::new()));
        (source, executor)
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let (_, executor) = executor(true);
        let value = executor.run(|| async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let (_, executor) = executor(true);
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let value = executor
            .run(move || {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(anyhow::Error::new(AppError::network("reset by peer")))
                    } else {
                        Ok("feed")
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "feed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_offline_without_queue() {
        let (_, executor) = executor(false);
        let config = ExecutionConfig::default().with_offline_queue(false);

        let err = executor
            .with_error_handling(|| async { Ok(()) }, &config)
            .await
            .unwrap_err();

        assert!(err.is_offline());
        assert_eq!(err.attempts(), 0);
        assert_eq!(err.user_message(), OFFLINE_MESSAGE);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(executor.queue().is_empty());
    }

    #[tokio::test]
    async fn test_error_accessors() {
        let (_, executor) = executor(true);
        let err = executor
            .with_error_handling(
                || async { Err::<(), _>(anyhow!("plain failure")) },
                &ExecutionConfig::no_retry(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 1);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), "plain failure");
        assert_eq!(err.into_inner().to_string(), "plain failure");
    }

    #[tokio::test]
    async fn test_context_keeps_app_error_message() {
        let (_, executor) = executor(true);
        let err = executor
            .with_error_handling(
                || async {
                    Err::<(), _>(
                        anyhow::Error::new(AppError::authentication("Session expired"))
                            .context("refreshing profile"),
                    )
                },
                &ExecutionConfig::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 1);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.user_message(), "Session expired");
    }
}
