//! Error taxonomy for Lifeline
//!
//! Every failure surfaced by the resilience layer is classified into an
//! [`ErrorKind`] and carries a retry flag that is fixed when the error is
//! constructed.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Message shown for values that are not recognized errors
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

const DEFAULT_NETWORK_MESSAGE: &str = "Network error occurred";
const DEFAULT_AUTHENTICATION_MESSAGE: &str = "Authentication error occurred";

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connectivity or transport failure
    Network,
    /// Credentials rejected or missing
    Authentication,
    /// Anything else; retry policy is decided by whoever builds the error
    Unknown,
}

impl ErrorKind {
    /// Whether errors of this kind are retried when no explicit flag is given
    pub fn default_retryable(&self) -> bool {
        match self {
            ErrorKind::Network => true,
            ErrorKind::Authentication => false,
            ErrorKind::Unknown => true,
        }
    }

    /// Stable code string for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Authentication => "AUTH_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Authentication => write!(f, "authentication"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A classified failure
///
/// The display text is the human-readable message only; kind and retry
/// metadata are available through accessors so they never leak into user
/// facing strings by accident.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
}

impl AppError {
    /// Create an error with an explicit retry flag
    pub fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    /// Create an error using the default retry policy of its kind
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, kind.default_retryable())
    }

    /// Retryable network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Network, message)
    }

    /// Non-retryable authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Authentication, message)
    }

    /// Unclassified error, retryable unless overridden with [`AppError::with_retryable`]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Unknown, message)
    }

    /// Override the retry flag
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Taxonomy view of an arbitrary failure
    ///
    /// Returns the first `AppError` found in the error chain. Anything else
    /// becomes a retryable `Unknown` error carrying the original display text.
    pub fn classify(error: &anyhow::Error) -> AppError {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<AppError>())
            .cloned()
            .unwrap_or_else(|| AppError::unknown(error.to_string()))
    }
}

impl Default for AppError {
    fn default() -> Self {
        Self::unknown(UNEXPECTED_ERROR_MESSAGE)
    }
}

/// Convenience constructors with the stock messages
impl AppError {
    pub fn network_default() -> Self {
        Self::network(DEFAULT_NETWORK_MESSAGE)
    }

    pub fn authentication_default() -> Self {
        Self::authentication(DEFAULT_AUTHENTICATION_MESSAGE)
    }
}

/// Extract a message that is safe to display from any error
pub fn error_message(error: &(dyn std::error::Error + 'static)) -> String {
    if let Some(app_error) = error.downcast_ref::<AppError>() {
        return app_error.message().to_string();
    }

    let message = error.to_string();
    if message.trim().is_empty() {
        UNEXPECTED_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

/// Extract a message that is safe to display from an arbitrary value
///
/// Recognizes `AppError`, `anyhow::Error` and boxed std errors. Any other value
/// (including panic payloads) yields [`UNEXPECTED_ERROR_MESSAGE`].
pub fn error_message_any(value: &dyn Any) -> String {
    if let Some(app_error) = value.downcast_ref::<AppError>() {
        return app_error.message().to_string();
    }
    if let Some(error) = value.downcast_ref::<anyhow::Error>() {
        return error_message(error.as_ref());
    }
    if let Some(error) = value.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
        return error_message(error.as_ref());
    }
    if let Some(error) = value.downcast_ref::<Box<dyn std::error::Error>>() {
        return error_message(error.as_ref());
    }

    UNEXPECTED_ERROR_MESSAGE.to_string()
}
