//! Test logging
//!
//! Engine events are emitted through `tracing`. Tests that want to see them
//! call [`init`] once; output goes through the test writer so it is
//! captured per test unless `--nocapture` is given.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive
pub const LOG_ENV: &str = "UNDERSTUDY_LOG";

/// Install a subscriber filtered by `UNDERSTUDY_LOG` (default `warn`).
///
/// Returns `false` when a global subscriber is already installed; calling
/// it again from another test is harmless.
pub fn init() -> bool {
    init_with_default("warn")
}

/// Like [`init`] with a custom fallback directive
pub fn init_with_default(directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init_with_default("debug");
        assert!(!init());
    }
}
