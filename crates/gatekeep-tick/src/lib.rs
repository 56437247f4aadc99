//! Fixed-period tick scheduler for Gatekeep's background work.
//!
//! The timeout sweeper wakes up on a fixed period, looks for pending
//! sessions past their deadline, and goes back to sleep. This crate is
//! the "wake up on a fixed period" part.
//!
//! # Disabled mode
//!
//! A `period` of zero disables ticking: [`TickScheduler::wait_for_tick`]
//! pends forever, which lets a `tokio::select!` loop keep serving its
//! other branches (e.g. a shutdown signal).
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         info = scheduler.wait_for_tick() => sweep(info),
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Zero disables ticking.
    pub period: Duration,
    /// Random delay (0..max) added to the *first* tick only, so several
    /// gates started together don't sweep in lockstep.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            initial_jitter: Duration::from_millis(50),
        }
    }
}

impl TickConfig {
    /// Shortest allowed non-zero period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// A config ticking every `period`, with default jitter.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Raises a non-zero period below [`Self::MIN_PERIOD`] to the minimum.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if !self.period.is_zero() && self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                min_ms = Self::MIN_PERIOD.as_millis() as u64,
                "tick period below minimum: clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How many whole periods were skipped because the previous tick's
    /// work (or the runtime) made this one late. 0 in normal operation.
    pub missed: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period scheduler.
///
/// Late ticks are never replayed: if the scheduler wakes up several
/// periods late it fires once, reports how many periods it missed, and
/// schedules the next tick one period from *now*. A sweep that runs late
/// doesn't need to run twice.
pub struct TickScheduler {
    period: Option<Duration>,
    tick_count: u64,
    total_missed: u64,
    next_tick: Option<Instant>,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick is one period (plus jitter)
    /// from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = (!config.period.is_zero()).then_some(config.period);

        let next_tick = period.map(|p| {
            let max_us = config.initial_jitter.as_micros() as u64;
            let jitter = if max_us == 0 {
                Duration::ZERO
            } else {
                Duration::from_micros(rand::rng().random_range(0..max_us))
            };
            Instant::now() + p + jitter
        });

        match period {
            Some(p) => debug!(period_ms = p.as_millis() as u64, "tick scheduler created"),
            None => debug!("tick scheduler created disabled (zero period)"),
        }

        Self {
            period,
            tick_count: 0,
            total_missed: 0,
            next_tick,
        }
    }

    /// A scheduler ticking every `period` with default jitter.
    pub fn every(period: Duration) -> Self {
        Self::new(TickConfig::every(period))
    }

    /// Waits until the next tick is due.
    ///
    /// When disabled this future never resolves on its own.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (Some(next), Some(period)) = (self.next_tick, self.period) else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        let missed = (late_by.as_nanos() / period.as_nanos()) as u64;
        if missed > 0 {
            warn!(
                tick = self.tick_count + 1,
                missed,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick late: skipping missed periods"
            );
        }

        self.tick_count += 1;
        self.total_missed += missed;
        self.next_tick = Some(now + period);

        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            missed,
        }
    }

    /// Whether ticking is disabled (zero period).
    pub fn is_disabled(&self) -> bool {
        self.period.is_none()
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Periods skipped so far because ticks fired late.
    pub fn total_missed(&self) -> u64 {
        self.total_missed
    }

    /// The tick period, or `None` when disabled.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}
