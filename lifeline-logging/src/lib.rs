//! Logging initialization for Lifeline
//!
//! Library crates log through the `log` facade or `tracing`; binaries call
//! one of the initializers here once at startup. Records from the `log`
//! facade are bridged into the tracing subscriber.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
