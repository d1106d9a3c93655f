//! Wheel-driven scroll velocity with debounced decay.

use crate::timers::{TimerId, TimerQueue};
use std::time::Duration;
use tracing::{debug, trace};

/// Default time without wheel input before velocity resets.
pub const DEFAULT_DECAY_DELAY: Duration = Duration::from_millis(100);

/// Scroll velocity sampler.
///
/// Each wheel event overwrites the velocity with `-delta_y / 2` and
/// re-arms a single decay timer. At most one decay timer is pending.
#[derive(Debug)]
pub struct ScrollSampler {
    /// Current velocity.
    velocity: f32,
    /// Pending decay timer.
    decay: Option<TimerId>,
    /// Timer storage.
    timers: TimerQueue,
    /// Delay before decay.
    delay: Duration,
}

impl ScrollSampler {
    pub fn new(delay: Duration) -> Self {
        Self {
            velocity: 0.0,
            decay: None,
            timers: TimerQueue::new(),
            delay,
        }
    }

    /// Handle a wheel event at `now`.
    pub fn on_wheel(&mut self, now: Duration, delta_y: f32) {
        self.velocity = -delta_y / 2.0;

        if let Some(id) = self.decay.take() {
            self.timers.cancel_timer(id);
        }
        self.decay = Some(self.timers.add_timer(now, self.delay));

        debug!("Wheel delta {} -> velocity {}, decay re-armed", delta_y, self.velocity);
    }

    /// Fire the decay timer if due. Returns whether velocity was reset.
    pub fn poll(&mut self, now: Duration) -> bool {
        let mut reset = false;

        for id in self.timers.ready_timers(now) {
            if self.decay == Some(id) {
                self.decay = None;
                self.velocity = 0.0;
                reset = true;
                trace!("Scroll velocity decayed");
            }
        }

        reset
    }

    /// Current velocity.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Whether a decay timer is pending.
    pub fn has_pending_decay(&self) -> bool {
        self.decay.is_some()
    }

    /// When the pending decay fires.
    pub fn decay_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Drop the pending timer and zero the velocity.
    pub fn cancel(&mut self) {
        if self.decay.take().is_some() {
            debug!("Cancelled pending scroll decay");
        }
        self.timers.clear();
        self.velocity = 0.0;
    }
}

impl Default for ScrollSampler {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_wheel_sets_velocity() {
        let mut scroll = ScrollSampler::default();
        scroll.on_wheel(ms(0), 200.0);
        assert_eq!(scroll.velocity(), -100.0);
        assert!(scroll.has_pending_decay());
    }

    #[test]
    fn test_velocity_decays_after_delay() {
        let mut scroll = ScrollSampler::default();
        scroll.on_wheel(ms(0), 200.0);

        assert!(!scroll.poll(ms(99)));
        assert_eq!(scroll.velocity(), -100.0);

        assert!(scroll.poll(ms(100)));
        assert_eq!(scroll.velocity(), 0.0);
        assert!(!scroll.has_pending_decay());
    }

    #[test]
    fn test_second_wheel_rearms_timer() {
        let mut scroll = ScrollSampler::default();
        scroll.on_wheel(ms(0), 200.0);
        scroll.on_wheel(ms(50), -40.0);
        assert_eq!(scroll.velocity(), 20.0);
        assert_eq!(scroll.decay_deadline(), Some(ms(150)));

        assert!(!scroll.poll(ms(100)));
        assert_eq!(scroll.velocity(), 20.0);

        assert!(scroll.poll(ms(150)));
        assert_eq!(scroll.velocity(), 0.0);
    }

    #[test]
    fn test_cancel_drops_pending_decay() {
        let mut scroll = ScrollSampler::default();
        scroll.on_wheel(ms(0), 200.0);
        scroll.cancel();

        assert!(!scroll.has_pending_decay());
        assert_eq!(scroll.decay_deadline(), None);
        assert!(!scroll.poll(ms(500)));
    }
}
