//! Periodic tasks (autosave, timer tick) tracked as deadlines.
//!
//! The scheduler never sleeps or spawns anything itself; the host polls
//! [`Scheduler::due`] with the current time and acts on what fired. Stopping
//! a task removes it, so a poll after a stop can never fire it again.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    Autosave,
    Tick,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    every_ms: i64,
    next_ms: i64,
}

/// A set of repeating deadlines, at most one per [`Task`].
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<Task, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) `task`, first firing `every` after `now_ms`.
    pub fn start(&mut self, task: Task, every: Duration, now_ms: i64) {
        let every_ms = (every.as_millis() as i64).max(1);
        self.timers.insert(
            task,
            Timer {
                every_ms,
                next_ms: now_ms + every_ms,
            },
        );
    }

    pub fn stop_all(&mut self) {
        self.timers.clear();
    }

    /// Milliseconds until the nearest deadline, if anything is running.
    pub fn next_deadline_in(&self, now_ms: i64) -> Option<i64> {
        self.timers
            .values()
            .map(|t| (t.next_ms - now_ms).max(0))
            .min()
    }

    /// Tasks whose deadline has passed. Missed periods are coalesced into one firing.
    pub fn due(&mut self, now_ms: i64) -> Vec<Task> {
        let mut fired = Vec::new();
        for (task, timer) in self.timers.iter_mut() {
            if now_ms >= timer.next_ms {
                let missed = (now_ms - timer.next_ms) / timer.every_ms;
                timer.next_ms += (missed + 1) * timer.every_ms;
                fired.push(*task);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let mut s = Scheduler::new();
        s.start(Task::Autosave, Duration::from_secs(30), 0);
        assert!(s.due(29_999).is_empty());
        assert_eq!(s.due(30_000), vec![Task::Autosave]);
        assert!(s.due(30_001).is_empty());
        assert_eq!(s.due(60_000), vec![Task::Autosave]);
    }

    #[test]
    fn missed_periods_coalesce() {
        let mut s = Scheduler::new();
        s.start(Task::Tick, Duration::from_secs(1), 0);
        assert_eq!(s.due(10_500), vec![Task::Tick]);
        assert!(s.due(10_900).is_empty());
        assert_eq!(s.due(11_000), vec![Task::Tick]);
    }

    #[test]
    fn stopped_task_never_fires() {
        let mut s = Scheduler::new();
        s.start(Task::Tick, Duration::from_secs(1), 0);
        s.start(Task::Autosave, Duration::from_secs(30), 0);
        assert_eq!(s.due(31_000), vec![Task::Autosave, Task::Tick]);
        s.stop_all();
        assert!(s.due(1_000_000).is_empty());
        assert_eq!(s.next_deadline_in(0), None);
    }

    #[test]
    fn next_deadline_reports_nearest() {
        let mut s = Scheduler::new();
        s.start(Task::Autosave, Duration::from_secs(30), 0);
        s.start(Task::Tick, Duration::from_secs(1), 0);
        assert_eq!(s.next_deadline_in(200), Some(800));
    }
}
