//! Process-wide resilience stack assembly

use lifeline_caching::{ResultCache, ResultCacheConfig};
use lifeline_config::LifelineConfig;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::connectivity::{ConnectivityMonitor, ConnectivitySource};
use crate::executor::ResilientExecutor;
use crate::probe::{HttpProbe, ProbeError};
use crate::queue::OfflineQueue;
use crate::retry::ExecutionConfig;

/// One cache, one queue, one monitor and the executor that uses them
pub struct ResilienceStack {
    cache: Arc<ResultCache>,
    queue: Arc<OfflineQueue>,
    monitor: Arc<ConnectivityMonitor>,
    executor: ResilientExecutor,
    probe: Option<Arc<HttpProbe>>,
    poll_interval: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ResilienceStack {
    /// Build the stack with an HTTP reachability probe
    pub fn from_config(config: &LifelineConfig) -> Result<Self, ProbeError> {
        let probe = Arc::new(HttpProbe::from_config(&config.connectivity)?);
        let mut stack = Self::with_source(config, probe.clone());
        stack.probe = Some(probe);
        Ok(stack)
    }

    /// Build the stack over any connectivity source
    pub fn with_source(config: &LifelineConfig, source: Arc<dyn ConnectivitySource>) -> Self {
        let cache = Arc::new(ResultCache::from_config(ResultCacheConfig {
            enabled: config.cache.enabled,
            default_ttl: config.cache.default_ttl,
        }));
        let queue = Arc::new(OfflineQueue::from_config(&config.queue));
        let monitor = Arc::new(ConnectivityMonitor::with_initial_state(
            source,
            queue.clone(),
            config.connectivity.assume_connected,
        ));
        let executor = ResilientExecutor::new(monitor.clone(), queue.clone(), cache.clone())
            .with_config(ExecutionConfig::from(&config.execution));

        debug!("Resilience stack assembled");

        Self {
            cache,
            queue,
            monitor,
            executor,
            probe: None,
            poll_interval: config.connectivity.poll_interval,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the connectivity listener and, if present, probe polling
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            debug!("Resilience stack already started");
            return;
        }

        // Subscribe before polling so the first change is not missed
        tasks.push(self.monitor.start());
        if let Some(probe) = &self.probe {
            tasks.push(probe.start_polling(self.poll_interval));
        }

        info!("Resilience stack started");
    }

    /// Stop background tasks
    pub fn stop(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    /// Forget cached results and pending actions (e.g. on logout)
    pub async fn reset(&self) {
        self.cache.clear().await;
        let dropped = self.queue.clear();
        info!("Resilience stack reset ({} queued actions discarded)", dropped);
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.executor
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn probe(&self) -> Option<&Arc<HttpProbe>> {
        self.probe.as_ref()
    }
}

impl Drop for ResilienceStack {
    fn drop(&mut self) {
        self.stop();
    }
}
