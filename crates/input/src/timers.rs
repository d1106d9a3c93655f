//! One-shot timers on an explicit clock.

use std::time::Duration;

/// Timer identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// A pending timer.
#[derive(Clone, Debug)]
struct Timer {
    id: TimerId,
    scheduled_at: Duration,
    delay: Duration,
    cancelled: bool,
}

impl Timer {
    fn deadline(&self) -> Duration {
        self.scheduled_at + self.delay
    }
}

/// Queue of one-shot timers.
///
/// `now` is the time since the owner was created. The queue never reads
/// a wall clock.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    timer_counter: u32,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer firing `delay` after `now`.
    pub fn add_timer(&mut self, now: Duration, delay: Duration) -> TimerId {
        self.timer_counter += 1;
        let id = TimerId(self.timer_counter);

        self.timers.push(Timer {
            id,
            scheduled_at: now,
            delay,
            cancelled: false,
        });

        id
    }

    /// Cancel a timer. Returns whether it was still pending.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        match self.timers.iter_mut().find(|t| t.id == id && !t.cancelled) {
            Some(timer) => {
                timer.cancelled = true;
                true
            }
            None => false,
        }
    }

    /// Remove and return timers whose deadline has passed, in deadline
    /// order. Cancelled timers are dropped.
    pub fn ready_timers(&mut self, now: Duration) -> Vec<TimerId> {
        let mut ready = Vec::new();
        let mut remaining = Vec::new();

        for timer in self.timers.drain(..) {
            if timer.cancelled {
                continue;
            }

            if now >= timer.deadline() {
                ready.push(timer);
            } else {
                remaining.push(timer);
            }
        }

        self.timers = remaining;
        ready.sort_by_key(|t| t.deadline());
        ready.into_iter().map(|t| t.id).collect()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers
            .iter()
            .filter(|t| !t.cancelled)
            .map(|t| t.deadline())
            .min()
    }

    /// Number of timers still pending.
    pub fn pending(&self) -> usize {
        self.timers.iter().filter(|t| !t.cancelled).count()
    }

    /// Drop every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
