//! Fixed-rate tick pacing against the wall clock.

use crate::config::TickConfig;
use garden_metrics::metric_defs;
use garden_sim::SimTime;
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

/// Summary of the ticks since the previous summary.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// Time since the pacer started.
    pub elapsed: SimTime,
    /// Ticks since the pacer started.
    pub total_ticks: u64,
    /// Achieved tick rate over the last interval.
    pub tick_rate_hz: f64,
    /// Lag warnings since the pacer started.
    pub lag_warnings: u64,
}

/// Statistics from a pacing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacerStats {
    pub ticks: u64,
    pub lag_warnings: u64,
    pub max_lag_ms: u64,
}

/// Sleeps between ticks so they land on a fixed schedule.
///
/// When a tick starts more than `max_lag_ms` late the schedule is reset to the
/// current time instead of running the missed ticks back to back.
#[derive(Debug)]
pub struct TickPacer {
    period: Duration,
    max_lag: Duration,
    summary_interval: Option<Duration>,
    start: Instant,
    next_tick: Instant,
    ticks: u64,
    lag_warnings: u64,
    max_lag_seen: Duration,
    last_summary: Instant,
    ticks_at_last_summary: u64,
}

impl TickPacer {
    /// Start pacing now. A non-positive rate falls back to 60 Hz.
    pub fn new(config: &TickConfig) -> Self {
        let rate = if config.rate_hz > 0.0 { config.rate_hz } else { 60.0 };
        let now = Instant::now();
        TickPacer {
            period: Duration::from_secs_f64(1.0 / rate),
            max_lag: Duration::from_millis(config.max_lag_ms),
            summary_interval: config.summary_interval_secs.map(Duration::from_secs),
            start: now,
            next_tick: now,
            ticks: 0,
            lag_warnings: 0,
            max_lag_seen: Duration::ZERO,
            last_summary: now,
            ticks_at_last_summary: 0,
        }
    }

    /// Time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time since the pacer started.
    pub fn elapsed(&self) -> SimTime {
        SimTime::from_duration(self.start.elapsed())
    }

    /// Block until the next tick is due and return its time.
    pub fn wait_for_next_tick(&mut self) -> SimTime {
        let now = Instant::now();
        if self.next_tick > now {
            thread::sleep(self.next_tick - now);
        }

        let now = Instant::now();
        let lag = now.saturating_duration_since(self.next_tick);
        self.max_lag_seen = self.max_lag_seen.max(lag);
        metrics::histogram!(metric_defs::TICK_LAG.name).record(lag.as_secs_f64() * 1000.0);

        if lag > self.max_lag {
            self.lag_warnings += 1;
            metrics::counter!(metric_defs::TICK_LAG_WARNINGS.name).increment(1);
            warn!(
                lag_ms = lag.as_millis() as u64,
                tick = self.ticks,
                "tick loop falling behind, skipping missed ticks"
            );
            self.next_tick = now + self.period;
        } else {
            self.next_tick += self.period;
        }

        self.ticks += 1;
        SimTime::from_duration(now - self.start)
    }

    /// Returns a summary when the summary interval has elapsed.
    pub fn check_summary(&mut self) -> Option<TickSummary> {
        let interval = self.summary_interval?;
        let now = Instant::now();
        let since_last = now.duration_since(self.last_summary);
        if since_last < interval {
            return None;
        }

        let ticks = self.ticks - self.ticks_at_last_summary;
        self.last_summary = now;
        self.ticks_at_last_summary = self.ticks;

        Some(TickSummary {
            elapsed: self.elapsed(),
            total_ticks: self.ticks,
            tick_rate_hz: ticks as f64 / since_last.as_secs_f64(),
            lag_warnings: self.lag_warnings,
        })
    }

    pub fn stats(&self) -> PacerStats {
        PacerStats {
            ticks: self.ticks,
            lag_warnings: self.lag_warnings,
            max_lag_ms: self.max_lag_seen.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rate_hz: f64, max_lag_ms: u64, summary: Option<u64>) -> TickConfig {
        TickConfig {
            rate_hz,
            max_lag_ms,
            summary_interval_secs: summary,
        }
    }

    #[test]
    fn test_ticks_are_paced() {
        let mut pacer = TickPacer::new(&config(100.0, 1000, None));
        assert_eq!(pacer.period(), Duration::from_millis(10));

        let start = Instant::now();
        let mut last = SimTime::ZERO;
        for _ in 0..5 {
            let t = pacer.wait_for_next_tick();
            assert!(t >= last);
            last = t;
        }
        // First tick is immediate, the next four wait a period each
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(pacer.stats().ticks, 5);
    }

    #[test]
    fn test_lag_warning_resets_schedule() {
        let mut pacer = TickPacer::new(&config(100.0, 5, None));
        pacer.wait_for_next_tick();
        thread::sleep(Duration::from_millis(40));
        pacer.wait_for_next_tick();

        let stats = pacer.stats();
        assert_eq!(stats.lag_warnings, 1);
        assert!(stats.max_lag_ms >= 20);

        // Back on schedule: the next tick waits instead of catching up
        let before = Instant::now();
        pacer.wait_for_next_tick();
        assert!(before.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let pacer = TickPacer::new(&config(0.0, 100, None));
        assert_eq!(pacer.period(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_summary_disabled() {
        let mut pacer = TickPacer::new(&config(60.0, 100, None));
        pacer.wait_for_next_tick();
        assert!(pacer.check_summary().is_none());
    }

    #[test]
    fn test_summary_after_interval() {
        let mut pacer = TickPacer::new(&config(200.0, 1000, Some(0)));
        pacer.wait_for_next_tick();
        pacer.wait_for_next_tick();
        let summary = pacer.check_summary().unwrap();
        assert_eq!(summary.total_ticks, 2);
        assert!(summary.tick_rate_hz > 0.0);
    }
}
