//! Pointer and scroll input sampling.
//!
//! Time is passed in explicitly as the offset since the scene was
//! mounted, so every timer here is deterministic under test.

pub mod events;
pub mod timers;
pub mod scroll;
pub mod pointer;

pub use events::{EventType, InputEvent, PointerEvent, WheelEvent};
pub use pointer::{normalize_pointer, PointerCapture, PointerSampler};
pub use scroll::ScrollSampler;
pub use timers::{TimerId, TimerQueue};
