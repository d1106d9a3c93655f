//! Frame loop driving a mounted scene.

use crate::scene::{FrameOutput, Scene};
use input::InputEvent;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An input event delivered before a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    /// Frame the event is delivered before, starting at 0.
    pub frame: u64,
    pub event: InputEvent,
}

/// Runs exactly one scene update per frame on a virtual clock.
pub struct FrameLoop {
    /// The scene being driven.
    scene: Scene,
    /// Whether the loop is running.
    running: bool,
    /// Frame duration.
    target_frame_time: Duration,
    /// Time since mount.
    clock: Duration,
    /// Frames run so far.
    frame: u64,
    /// Pending events, ordered by frame.
    events: VecDeque<ScheduledEvent>,
}

impl FrameLoop {
    /// Create a loop at 60 frames per second.
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            running: true,
            target_frame_time: Duration::from_secs_f64(1.0 / 60.0),
            clock: Duration::ZERO,
            frame: 0,
            events: VecDeque::new(),
        }
    }

    /// Set the target frame rate. Rates whose frame time is zero or not
    /// representable leave the frame time unchanged.
    pub fn set_frame_rate(&mut self, fps: f64) {
        match Duration::try_from_secs_f64(1.0 / fps) {
            Ok(frame_time) if !frame_time.is_zero() => self.target_frame_time = frame_time,
            _ => warn!("Ignoring frame rate {}", fps),
        }
    }

    pub fn frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Deliver `event` before frame `frame`. Events for the same frame
    /// keep their scheduling order.
    pub fn schedule(&mut self, frame: u64, event: InputEvent) {
        let index = self.events.partition_point(|e| e.frame <= frame);
        self.events.insert(index, ScheduledEvent { frame, event });
    }

    /// Run a single frame: advance the clock, deliver due events, then
    /// update the scene.
    pub fn tick(&mut self) -> Option<FrameOutput> {
        if !self.running {
            return None;
        }

        self.clock += self.target_frame_time;

        while let Some(scheduled) = self.events.front() {
            if scheduled.frame > self.frame {
                break;
            }
            let event = scheduled.event;
            self.events.pop_front();

            let handled = self.scene.handle_event(self.clock, &event);
            debug!(
                "Frame {}: {} {}",
                self.frame,
                event.event_type().as_str(),
                if handled { "handled" } else { "ignored" }
            );
        }

        let output = self.scene.frame(self.clock, self.target_frame_time);
        self.frame += 1;
        output
    }

    /// Run `frames` frames, passing each output to `on_frame`. Returns the
    /// number of frames run.
    pub fn run(&mut self, frames: u64, mut on_frame: impl FnMut(&FrameOutput)) -> u64 {
        let mut ran = 0;
        while ran < frames {
            let Some(output) = self.tick() else {
                break;
            };
            on_frame(&output);
            ran += 1;
        }
        ran
    }

    /// Stop the loop and unmount the scene.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.events.clear();
            self.scene.unmount();
            info!("Frame loop stopped at frame {}", self.frame);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Time since mount.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::tests::test_graph;
    use input::{PointerEvent, WheelEvent};
    use std::sync::Arc;

    fn frame_loop() -> FrameLoop {
        let config = SceneConfig::default().with_viewport(800.0, 600.0);
        FrameLoop::new(Scene::mount(Arc::new(test_graph()), config).unwrap())
    }

    #[test]
    fn test_frame_loop_tick() {
        let mut frame_loop = frame_loop();
        let output = frame_loop.tick().unwrap();
        assert_eq!(output.frame, 1);
        assert_eq!(frame_loop.clock(), frame_loop.frame_time());
    }

    #[test]
    fn test_events_delivered_in_frame_order() {
        let mut frame_loop = frame_loop();
        let center = frame_loop.scene().screen_rect().center();

        frame_loop.schedule(2, InputEvent::PointerUp(PointerEvent::new(1, center)));
        frame_loop.schedule(1, InputEvent::PointerDown(PointerEvent::new(1, center)));
        assert_eq!(frame_loop.pending_events(), 2);

        frame_loop.tick();
        assert!(!frame_loop.scene().pressed());
        frame_loop.tick();
        assert!(frame_loop.scene().pressed());
        frame_loop.tick();
        assert!(!frame_loop.scene().pressed());
        assert_eq!(frame_loop.pending_events(), 0);
    }

    #[test]
    fn test_scroll_decays_on_virtual_clock() {
        let mut frame_loop = frame_loop();
        frame_loop.set_frame_rate(50.0);
        let center = frame_loop.scene().screen_rect().center();
        frame_loop.schedule(0, InputEvent::Wheel(WheelEvent::new(center, 200.0)));

        // Wheel lands at 20 ms; decay is due at 120 ms, the sixth frame.
        let mut velocities = Vec::new();
        frame_loop.run(6, |out| velocities.push(out.state.scroll_velocity));
        assert_eq!(velocities[..5], [-100.0; 5]);
        assert_eq!(velocities[5], 0.0);
    }

    #[test]
    fn test_unusable_frame_rates_are_ignored() {
        let mut frame_loop = frame_loop();
        let default = frame_loop.frame_time();

        for fps in [0.0, -30.0, 1e-300, f64::NAN, f64::INFINITY] {
            frame_loop.set_frame_rate(fps);
            assert_eq!(frame_loop.frame_time(), default);
        }

        frame_loop.set_frame_rate(50.0);
        assert_eq!(frame_loop.frame_time(), Duration::from_secs_f64(1.0 / 50.0));
    }

    #[test]
    fn test_stop_unmounts_scene() {
        let mut frame_loop = frame_loop();
        assert_eq!(frame_loop.run(3, |_| {}), 3);

        frame_loop.stop();
        assert!(!frame_loop.scene().is_running());
        assert!(frame_loop.tick().is_none());
        assert_eq!(frame_loop.run(5, |_| {}), 0);
    }
}
