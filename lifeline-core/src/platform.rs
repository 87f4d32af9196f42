//! Platform-specific error hooks
//!
//! Hooks report a failure to the platform log. They never surface anything to
//! the caller.

use log::error;

/// Signature of a platform error hook
pub type PlatformErrorHook = fn(&(dyn std::error::Error + 'static));

fn ios_hook(err: &(dyn std::error::Error + 'static)) {
    error!("iOS Error: {}", err);
}

fn android_hook(err: &(dyn std::error::Error + 'static)) {
    error!("Android Error: {}", err);
}

fn default_hook(err: &(dyn std::error::Error + 'static)) {
    error!("Error: {}", err);
}

/// Select the hook for the target operating system
pub fn platform_error_hook() -> PlatformErrorHook {
    if cfg!(target_os = "ios") {
        ios_hook
    } else if cfg!(target_os = "android") {
        android_hook
    } else {
        default_hook
    }
}

/// Report an error through the platform hook
pub fn report_platform_error(err: &(dyn std::error::Error + 'static)) {
    (platform_error_hook())(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;

    #[test]
    fn test_hooks_only_log() {
        let hook = platform_error_hook();
        hook(&AppError::network("offline"));
        report_platform_error(&AppError::authentication("denied"));
    }
}
