//! Fixed-rate wall-clock ticker that drives a session's [`GameClock`].
//!
//! [`GameClock`]: crate::GameClock

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the actor wakes up late for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Skip the missed tick(s) and schedule the next one from now.
    /// Prevents a burst of back-to-back ticks after a stall.
    #[default]
    Skip,
    /// Keep the original cadence. The next tick fires at its originally
    /// scheduled time, which may be immediately.
    Drop,
}

/// Configuration for a [`Ticker`].
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Time between ticks. Zero = event-driven (the ticker never fires and
    /// the session clock only moves on explicit ticks).
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Random jitter (0–max µs) added to the *first* tick so sessions
    /// created at the same instant don't all tick together.
    pub initial_jitter_us: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            policy: TickPolicy::default(),
            initial_jitter_us: 2_000,
        }
    }
}

impl TickerConfig {
    /// Shortest supported non-zero interval.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// A config ticking every `interval` with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// An event-driven config: the ticker never fires.
    pub fn event_driven() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Ticker::new`]. A non-zero interval below
    /// [`Self::MIN_INTERVAL`] is raised to it.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_us = self.interval.as_micros() as u64,
                "tick interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about one tick, returned by [`Ticker::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Session time since the ticker was created. This is the value to
    /// hand to the game clock.
    pub elapsed: Duration,
    /// `true` if this tick fired late.
    pub overrun: bool,
    /// How many ticks were skipped due to overrun (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Fixed-rate ticker. One per session actor.
pub struct Ticker {
    config: TickerConfig,
    started: Instant,
    next_tick: Option<Instant>,
    tick_count: u64,
    paused: bool,
}

impl Ticker {
    /// Creates a ticker. Session time starts now.
    pub fn new(config: TickerConfig) -> Self {
        let config = config.validated();
        let started = Instant::now();

        let next_tick = (!config.interval.is_zero()).then(|| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            started + config.interval + jitter
        });

        if next_tick.is_none() {
            debug!("ticker created in event-driven mode");
        } else {
            debug!(
                interval_ms = config.interval.as_millis() as u64,
                policy = ?config.policy,
                "ticker created"
            );
        }

        Self {
            config,
            started,
            next_tick,
            tick_count: 0,
            paused: false,
        }
    }

    /// Creates a ticker for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickerConfig::with_interval(interval))
    }

    /// Waits until the next tick is due.
    ///
    /// In event-driven mode or while paused this future never resolves,
    /// which is what a `tokio::select!` branch wants.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let interval = self.config.interval;
        let next = match self.next_tick {
            Some(next) if !self.paused => next,
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // >10% late counts as an overrun.
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                now + interval
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, keeping original schedule"
                    );
                }
                next + interval
            }
        });

        let elapsed = now.saturating_duration_since(self.started);
        trace!(tick = self.tick_count, elapsed_ms = elapsed.as_millis() as u64, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            elapsed,
            overrun,
            ticks_skipped,
        }
    }

    /// Pauses ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "ticker paused");
        }
    }

    /// Resumes ticking. The next tick is one interval from now, so time
    /// spent paused doesn't turn into a burst of ticks.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if !self.config.interval.is_zero() {
                self.next_tick = Some(Instant::now() + self.config.interval);
            }
            debug!(tick = self.tick_count, "ticker resumed");
        }
    }

    /// Whether the ticker is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this ticker never fires (interval zero).
    pub fn is_event_driven(&self) -> bool {
        self.next_tick.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Session time since the ticker was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
