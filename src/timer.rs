//! Host-clocked timers.
//!
//! The overlay never reads the wall clock itself: the host passes `now` into
//! every handler and into `tick`. A timer is cancelled by dropping it, so
//! owners keep them in `Option` fields and `take()` them on every exit path.

use std::time::{Duration, Instant};

/// A one-shot point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    instant: Instant,
}

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self { instant }
    }

    /// Deadline `delay` after `now`
    pub fn after(now: Instant, delay: Duration) -> Self {
        Self::at(now + delay)
    }

    pub fn instant(&self) -> Instant {
        self.instant
    }

    /// Checks if the deadline has passed
    pub fn has_passed(&self, now: Instant) -> bool {
        now >= self.instant
    }

    /// Returns None if the deadline has passed
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        if now < self.instant {
            Some(self.instant.duration_since(now))
        } else {
            None
        }
    }
}

/// A repeating timer that reports how many periods elapsed since last polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    next: Instant,
    period: Duration,
}

impl Interval {
    /// First firing is one `period` after `now`
    pub fn start(now: Instant, period: Duration) -> Self {
        Self {
            next: now + period,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Count elapsed periods up to `now` and advance past them
    pub fn poll(&mut self, now: Instant) -> u32 {
        if self.period.is_zero() {
            return 0;
        }
        let mut fired = 0;
        while now >= self.next {
            fired += 1;
            self.next += self.period;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline() {
        let start = Instant::now();
        let deadline = Deadline::after(start, Duration::from_millis(50));

        assert!(!deadline.has_passed(start));
        assert_eq!(
            deadline.time_remaining(start + Duration::from_millis(20)),
            Some(Duration::from_millis(30))
        );
        assert!(deadline.has_passed(start + Duration::from_millis(50)));
        assert_eq!(deadline.time_remaining(start + Duration::from_millis(60)), None);
    }

    #[test]
    fn test_interval_counts_missed_periods() {
        let start = Instant::now();
        let mut interval = Interval::start(start, Duration::from_millis(100));

        assert_eq!(interval.poll(start + Duration::from_millis(99)), 0);
        assert_eq!(interval.poll(start + Duration::from_millis(100)), 1);
        assert_eq!(interval.poll(start + Duration::from_millis(100)), 0);
        assert_eq!(interval.poll(start + Duration::from_millis(450)), 3);
        assert_eq!(interval.poll(start + Duration::from_millis(500)), 1);
    }

    #[test]
    fn test_zero_period_never_fires() {
        let start = Instant::now();
        let mut interval = Interval::start(start, Duration::ZERO);
        assert_eq!(interval.poll(start + Duration::from_secs(1)), 0);
    }
}
