//! The session clock and its single pending timeout.

use std::time::Duration;

use tracing::trace;

/// Elapsed session time plus at most one armed deadline.
///
/// ```text
///   set_timeout(d)            advance(t), t > deadline
/// ─────────────────→ [Armed] ───────────────────────────→ [Idle] + fire
///                       │
///                       └── clear_timeout() / set_timeout(d') replaces
/// ```
///
/// Timeouts fire only from [`advance`](Self::advance), so a timeout set for
/// `d` fires somewhere in `[d, d + tick interval)` after it was armed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameClock {
    now: Duration,
    deadline: Option<Duration>,
}

impl GameClock {
    /// A clock at time zero with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last processed session time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// The armed deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Whether a timeout is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Arms a timeout `delay` after the current time, replacing any
    /// timeout already armed.
    pub fn set_timeout(&mut self, delay: Duration) {
        let deadline = self.now.checked_add(delay).unwrap_or(Duration::MAX);
        trace!(now_ms = self.now.as_millis() as u64, deadline_ms = deadline.as_millis() as u64, "timeout armed");
        self.deadline = Some(deadline);
    }

    /// Disarms the pending timeout and returns its deadline.
    pub fn clear_timeout(&mut self) -> Option<Duration> {
        self.deadline.take()
    }

    /// Moves session time to `to`.
    ///
    /// Returns `Some(to)` when this call fired the armed timeout (the
    /// deadline has been disarmed by then), `None` otherwise. A deadline
    /// fires once `to` is strictly past it.
    ///
    /// Time never runs backwards: a `to` earlier than the last processed
    /// time is stale and ignored.
    pub fn advance(&mut self, to: Duration) -> Option<Duration> {
        if to < self.now {
            trace!(
                now_ms = self.now.as_millis() as u64,
                stale_ms = to.as_millis() as u64,
                "stale tick ignored"
            );
            return None;
        }
        self.now = to;

        match self.deadline {
            Some(deadline) if to > deadline => {
                self.deadline = None;
                Some(to)
            }
            _ => None,
        }
    }
}
