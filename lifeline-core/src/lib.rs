//! Core types for Lifeline
//!
//! This crate defines the failure vocabulary shared by every other Lifeline
//! crate: the error kinds, their default retry policy, and the helpers the
//! presentation layer uses to turn any failure into a message that is safe to
//! show to a user.

pub mod error;
pub mod platform;

// Re-export commonly used types at the crate root
pub use error::{error_message, error_message_any, AppError, ErrorKind, UNEXPECTED_ERROR_MESSAGE};
pub use platform::{platform_error_hook, report_platform_error, PlatformErrorHook};
