//! Cooperative cancellation for long-running workloads.
//!
//! The flag is set asynchronously by signal delivery and only ever read by
//! the driver, at well-defined suspension points between pages and probes,
//! never inside a timed operation. Already-collected samples survive
//! cancellation.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Shared cancellation flag, passed by reference into the workload driver.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Install a handler that sets this token on SIGINT or SIGTERM.
    ///
    /// Both termination signals behave identically: set the flag and let the
    /// current phase wind down.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Signal`] if the handler cannot be registered.
    pub fn install(&self) -> Result<()> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || {
            info!("termination signal received, finishing current phase");
            flag.store(true, Ordering::Relaxed);
        })?;
        Ok(())
    }
}

/// Sleep for `duration`, waking early if the token is cancelled.
///
/// Polls in short slices rather than sleeping the whole duration in one call.
/// Returns `true` if the full duration elapsed, `false` on cancellation.
pub fn sleep_interruptible(token: &CancelToken, duration: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(100);
    // A duration beyond the clock's range has no representable deadline;
    // treat it as unbounded and sleep in slices until cancelled.
    let deadline = Instant::now().checked_add(duration);
    loop {
        if token.is_cancelled() {
            return false;
        }
        let slice = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return true;
                }
                remaining.min(SLICE)
            }
            None => SLICE,
        };
        std::thread::sleep(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_sleep_completes_when_not_cancelled() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(sleep_interruptible(&token, Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_sleep_survives_unrepresentable_duration() {
        // u64::MAX seconds overflows the monotonic clock; the sleep must
        // neither panic nor block once the token is set.
        let token = CancelToken::new();
        token.cancel();
        assert!(!sleep_interruptible(&token, Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn test_sleep_returns_early_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(!sleep_interruptible(&token, Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
