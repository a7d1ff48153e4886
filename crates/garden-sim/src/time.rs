//! Simulation time.

use std::fmt;
use std::time::Duration;

/// Time since the garden session started, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(u64);

impl SimTime {
    /// Session start.
    pub const ZERO: SimTime = SimTime(0);

    /// Create from milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        SimTime(ms)
    }

    /// Create from fractional seconds. Negative values saturate to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        SimTime((secs.max(0.0) * 1000.0) as u64)
    }

    /// Create from an elapsed wall clock duration.
    pub fn from_duration(d: Duration) -> Self {
        SimTime(d.as_millis() as u64)
    }

    /// Milliseconds since start.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Seconds since start.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is later.
    pub fn saturating_sub(&self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This time advanced by `ms` milliseconds.
    pub const fn add_millis(&self, ms: u64) -> SimTime {
        SimTime(self.0 + ms)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(SimTime::from_secs_f64(1.5).as_millis(), 1500);
        assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
        assert_eq!(SimTime::from_duration(Duration::from_millis(250)).as_millis(), 250);
        assert_eq!(SimTime::from_millis(100).add_millis(50).as_millis(), 150);
    }

    #[test]
    fn test_saturating_sub() {
        let a = SimTime::from_millis(100);
        let b = SimTime::from_millis(400);
        assert_eq!(b.saturating_sub(a), 300);
        assert_eq!(a.saturating_sub(b), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_millis(1250).to_string(), "1.250s");
    }
}
