use std::time::{Duration, Instant};

/// A one-shot deadline owned by the state it will mutate.
///
/// Nothing runs on its own: the owner polls [`ScheduledTask::fire`] from its
/// tick, so dropping or cancelling the task is enough to stop it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledTask {
    due: Option<Instant>,
}

impl ScheduledTask {
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.due = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut task = ScheduledTask::default();
        task.schedule(t0, Duration::from_millis(1000));

        assert!(!task.fire(t0 + Duration::from_millis(999)));
        assert!(task.fire(t0 + Duration::from_millis(1000)));
        assert!(!task.fire(t0 + Duration::from_millis(5000)));
        assert!(!task.is_pending());
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let t0 = Instant::now();
        let mut task = ScheduledTask::default();
        task.schedule(t0, Duration::from_millis(10));
        task.cancel();
        assert!(!task.fire(t0 + Duration::from_secs(60)));
        assert_eq!(task.remaining(t0), None);
    }

    #[test]
    fn test_remaining_counts_down_to_zero() {
        let t0 = Instant::now();
        let mut task = ScheduledTask::default();
        task.schedule(t0, Duration::from_millis(300));
        assert_eq!(task.remaining(t0), Some(Duration::from_millis(300)));
        assert_eq!(
            task.remaining(t0 + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
