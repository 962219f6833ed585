//! Debounced hover tracking.
//!
//! Hit-testing produces a candidate on every pointer move; a candidate is
//! only committed once it has stayed the same for the debounce delay. A
//! candidate equal to the committed hover cancels any pending change.

use crate::timer::Deadline;
use crate::Target;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
struct Pending {
    candidate: Option<Target>,
    deadline: Deadline,
}

/// A confirmed hover change
#[derive(Debug, Clone, PartialEq)]
pub struct HoverCommit {
    pub previous: Option<Target>,
    pub current: Option<Target>,
}

#[derive(Debug, Clone)]
pub struct HoverDebouncer {
    delay: Duration,
    committed: Option<Target>,
    pending: Option<Pending>,
}

fn same_identity(a: Option<&Target>, b: Option<&Target>) -> bool {
    a.map(|t| &t.stable_id) == b.map(|t| &t.stable_id)
}

impl HoverDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            committed: None,
            pending: None,
        }
    }

    pub fn committed(&self) -> Option<&Target> {
        self.committed.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed the latest hit-test result
    pub fn observe(&mut self, candidate: Option<Target>, now: Instant) {
        if same_identity(candidate.as_ref(), self.committed.as_ref()) {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some(pending) if same_identity(pending.candidate.as_ref(), candidate.as_ref()) => {
                // Same candidate: keep the original deadline, refresh geometry
                pending.candidate = candidate;
            }
            _ => {
                self.pending = Some(Pending {
                    candidate,
                    deadline: Deadline::after(now, self.delay),
                });
            }
        }
    }

    /// Commit the pending candidate once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<HoverCommit> {
        if !self.pending.as_ref()?.deadline.has_passed(now) {
            return None;
        }
        let pending = self.pending.take()?;
        let previous = std::mem::replace(&mut self.committed, pending.candidate.clone());
        Some(HoverCommit {
            previous,
            current: pending.candidate,
        })
    }

    /// Drop any pending candidate
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Forget everything; returns the committed hover so its highlight can be removed
    pub fn reset(&mut self) -> Option<Target> {
        self.pending = None;
        self.committed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeId, Rectangle};

    fn target(stable_id: &str) -> Target {
        Target {
            node: NodeId::new(),
            stable_id: stable_id.to_string(),
            bounds: Rectangle::default(),
        }
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_commit_after_delay() {
        let start = Instant::now();
        let mut hover = HoverDebouncer::new(Duration::from_millis(50));

        hover.observe(Some(target("a")), start);
        assert_eq!(hover.poll(ms(start, 49)), None);

        let commit = hover.poll(ms(start, 50)).unwrap();
        assert_eq!(commit.previous, None);
        assert_eq!(commit.current.unwrap().stable_id, "a");
        assert_eq!(hover.committed().unwrap().stable_id, "a");
        assert!(!hover.is_pending());
    }

    #[test]
    fn test_repeated_candidate_keeps_deadline() {
        let start = Instant::now();
        let mut hover = HoverDebouncer::new(Duration::from_millis(50));

        hover.observe(Some(target("a")), start);
        hover.observe(Some(target("a")), ms(start, 30));
        hover.observe(Some(target("a")), ms(start, 45));
        assert!(hover.poll(ms(start, 50)).is_some());

        // Same as committed: nothing to do
        hover.observe(Some(target("a")), ms(start, 60));
        assert!(!hover.is_pending());
        assert_eq!(hover.poll(ms(start, 200)), None);
    }

    #[test]
    fn test_transient_miss_is_absorbed() {
        let start = Instant::now();
        let mut hover = HoverDebouncer::new(Duration::from_millis(50));
        hover.observe(Some(target("a")), start);
        hover.poll(ms(start, 50));

        // A brief miss while crossing an edge, then back on the same node
        hover.observe(None, ms(start, 60));
        hover.observe(Some(target("a")), ms(start, 70));
        assert_eq!(hover.poll(ms(start, 200)), None);
        assert_eq!(hover.committed().unwrap().stable_id, "a");
    }

    #[test]
    fn test_changing_candidate_restarts_timer() {
        let start = Instant::now();
        let mut hover = HoverDebouncer::new(Duration::from_millis(50));

        hover.observe(Some(target("a")), start);
        hover.observe(Some(target("b")), ms(start, 40));
        assert_eq!(hover.poll(ms(start, 60)), None);

        let commit = hover.poll(ms(start, 90)).unwrap();
        assert_eq!(commit.current.unwrap().stable_id, "b");
    }

    #[test]
    fn test_reset_returns_committed() {
        let start = Instant::now();
        let mut hover = HoverDebouncer::new(Duration::from_millis(50));
        hover.observe(Some(target("a")), start);
        hover.poll(ms(start, 50));

        assert_eq!(hover.reset().unwrap().stable_id, "a");
        assert!(hover.committed().is_none());
    }
}
