use std::time::{Duration, Instant};

/// Absolute point in monotonic time bounding one whole exchange.
///
/// Computed once when an exchange starts. Every phase (channel wait, connect,
/// write, read) draws from the same remaining budget; no phase gets a fresh
/// timeout of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Creates a deadline `timeout` from now.
    ///
    /// A timeout too large to represent saturates at the configured maximum.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + Duration::from_millis(crate::config::MAX_TIMEOUT_MS));
        Self { at }
    }

    /// Returns the time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() {
            None
        } else {
            Some(left)
        }
    }

    /// Returns true once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// Returns the absolute instant of the deadline.
    pub fn instant(&self) -> Instant {
        self.at
    }
}
