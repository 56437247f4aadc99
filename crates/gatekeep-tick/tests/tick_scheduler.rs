//! Integration tests for the fixed-period tick scheduler.
//!
//! Uses `start_paused = true` so Tokio's clock auto-advances whenever
//! every task is idle: `sleep_until` resolves instantly, deterministically.

use std::time::Duration;

use gatekeep_tick::{TickConfig, TickScheduler};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn no_jitter(period: Duration) -> TickConfig {
    TickConfig {
        period,
        initial_jitter: Duration::ZERO,
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_ticks_every_second() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, Duration::from_secs(1));
}

#[test]
fn test_validated_clamps_tiny_period() {
    let cfg = TickConfig::every(Duration::from_millis(1)).validated();
    assert_eq!(cfg.period, TickConfig::MIN_PERIOD);
}

#[test]
fn test_validated_keeps_zero_period() {
    let cfg = TickConfig::every(Duration::ZERO).validated();
    assert_eq!(cfg.period, Duration::ZERO);
}

// =========================================================================
// Scheduler state
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::every(Duration::from_millis(500));
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.period(), Some(Duration::from_millis(500)));
    assert!(!s.is_disabled());
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_is_disabled() {
    let s = TickScheduler::every(Duration::ZERO);
    assert!(s.is_disabled());
    assert_eq!(s.period(), None);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ticks_fire_once_per_period() {
    let mut s = TickScheduler::new(no_jitter(Duration::from_secs(1)));
    let start = Instant::now();

    for expected in 1..=3 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert_eq!(info.missed, 0);
    }

    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(s.tick_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_reports_missed_periods_and_fires_once() {
    let mut s = TickScheduler::new(no_jitter(Duration::from_secs(1)));
    s.wait_for_tick().await;

    // Simulate a long stall between ticks.
    tokio::time::advance(Duration::from_millis(3_500)).await;
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 2);
    assert_eq!(info.missed, 2);
    assert_eq!(s.total_missed(), 2);

    // Next tick is a full period after the late one, not a burst.
    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_never_ticks() {
    let mut s = TickScheduler::every(Duration::ZERO);

    let result =
        tokio::time::timeout(Duration::from_secs(60), s.wait_for_tick()).await;

    assert!(result.is_err(), "disabled scheduler must not tick");
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_first_tick_within_bound() {
    let mut s = TickScheduler::new(TickConfig {
        period: Duration::from_secs(1),
        initial_jitter: Duration::from_millis(200),
    });
    let start = Instant::now();

    s.wait_for_tick().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1_200));
}
