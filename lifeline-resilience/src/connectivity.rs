//! Connectivity monitoring
//!
//! The monitor caches the last known reachability state, fans transitions out
//! to subscribers, and drains the offline queue whenever the device comes
//! back online.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::queue::{DrainReport, OfflineQueue};

const EVENT_CAPACITY: usize = 16;

/// Source of reachability information
#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// One-shot live reachability query
    async fn fetch(&self) -> bool;

    /// Stream of reachability changes
    fn subscribe(&self) -> broadcast::Receiver<bool>;
}

/// Reachability transition observed by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEvent {
    pub connected: bool,
    pub at: DateTime<Utc>,
}

/// Connectivity source driven programmatically
///
/// Hosts that receive platform network callbacks forward them through
/// [`ManualConnectivity::set_connected`].
pub struct ManualConnectivity {
    connected: AtomicBool,
    sender: broadcast::Sender<bool>,
}

impl ManualConnectivity {
    pub fn new(connected: bool) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            connected: AtomicBool::new(connected),
            sender,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Update the state and notify subscribers
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        // No subscribers is fine
        let _ = self.sender.send(connected);
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivitySource for ManualConnectivity {
    async fn fetch(&self) -> bool {
        self.is_connected()
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Tracks reachability and triggers offline queue drains
pub struct ConnectivityMonitor {
    source: Arc<dyn ConnectivitySource>,
    queue: Arc<OfflineQueue>,
    connected: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor that assumes the device starts online
    pub fn new(source: Arc<dyn ConnectivitySource>, queue: Arc<OfflineQueue>) -> Self {
        Self::with_initial_state(source, queue, true)
    }

    pub fn with_initial_state(
        source: Arc<dyn ConnectivitySource>,
        queue: Arc<OfflineQueue>,
        connected: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            queue,
            connected: AtomicBool::new(connected),
            events,
        }
    }

    /// Last known state
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Live probe through the source
    pub async fn fetch_current(&self) -> bool {
        self.source.fetch().await
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Receive state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Record a state report from the source
    ///
    /// Repeated reports of the same state are ignored. Coming back online
    /// spawns a drain of the offline queue and returns its handle; the drain
    /// itself never fails. An online report made outside a Tokio runtime
    /// cannot spawn the drain and leaves the state unchanged, so the next
    /// report from inside a runtime still counts as the reconnect.
    pub fn handle_change(&self, connected: bool) -> Option<JoinHandle<DrainReport>> {
        let runtime = if connected {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => Some(runtime),
                Err(e) => {
                    warn!("Cannot drain offline queue outside a Tokio runtime: {}", e);
                    return None;
                }
            }
        } else {
            None
        };

        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return None;
        }

        info!(
            "Connectivity changed: {}",
            if connected { "online" } else { "offline" }
        );
        let _ = self.events.send(ConnectivityEvent {
            connected,
            at: Utc::now(),
        });

        let queue = Arc::clone(&self.queue);
        runtime.map(|runtime| runtime.spawn(async move { queue.process_queue().await }))
    }

    /// Feed source events into [`ConnectivityMonitor::handle_change`]
    ///
    /// The listener runs until the source's channel closes.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut receiver = self.source.subscribe();
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(connected) => {
                        monitor.handle_change(connected);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Connectivity listener skipped {} events, re-probing",
                            skipped
                        );
                        let connected = monitor.fetch_current().await;
                        monitor.handle_change(connected);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Connectivity source closed, listener stopped");
        })
    }
}
