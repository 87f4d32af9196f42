//! Resilient execution for Lifeline
//!
//! This crate wraps fallible, network-dependent actions with connectivity
//! checks, retries with backoff, an offline replay queue and the result cache.

pub mod backoff;
pub mod connectivity;
pub mod executor;
pub mod probe;
pub mod queue;
pub mod retry;
pub mod stack;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use connectivity::{
    ConnectivityEvent, ConnectivityMonitor, ConnectivitySource, ManualConnectivity,
};
pub use executor::{ExecutionError, ResilientExecutor, OFFLINE_MESSAGE, QUEUED_MESSAGE};
pub use probe::{HttpProbe, ProbeError};
pub use queue::{DrainReport, OfflineQueue, QueuedAction, QueuedActionInfo, QueuedInvoke};
pub use retry::{ExecutionConfig, Retryable};
pub use stack::ResilienceStack;
