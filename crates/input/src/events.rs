//! Input events delivered to interactive meshes.

use common::Point;
use serde::{Deserialize, Serialize};

/// Event type enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    PointerDown,
    PointerUp,
    PointerMove,
    Wheel,
}

impl EventType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pointerdown" => Some(EventType::PointerDown),
            "pointerup" => Some(EventType::PointerUp),
            "pointermove" => Some(EventType::PointerMove),
            "wheel" => Some(EventType::Wheel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PointerDown => "pointerdown",
            EventType::PointerUp => "pointerup",
            EventType::PointerMove => "pointermove",
            EventType::Wheel => "wheel",
        }
    }
}

/// Pointer event data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Pointer ID, stable for the lifetime of one contact.
    pub pointer_id: u32,
    /// Position in page coordinates.
    pub page: Point,
    /// Button that changed state.
    pub button: i16,
}

impl PointerEvent {
    pub fn new(pointer_id: u32, page: Point) -> Self {
        Self {
            pointer_id,
            page,
            button: 0,
        }
    }
}

/// Wheel event data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Position in page coordinates.
    pub page: Point,
    pub delta_x: f32,
    pub delta_y: f32,
}

impl WheelEvent {
    pub fn new(page: Point, delta_y: f32) -> Self {
        Self {
            page,
            delta_x: 0.0,
            delta_y,
        }
    }
}

/// Any input event the scene reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerUp(PointerEvent),
    PointerMove(PointerEvent),
    Wheel(WheelEvent),
}

impl InputEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            InputEvent::PointerDown(_) => EventType::PointerDown,
            InputEvent::PointerUp(_) => EventType::PointerUp,
            InputEvent::PointerMove(_) => EventType::PointerMove,
            InputEvent::Wheel(_) => EventType::Wheel,
        }
    }

    /// Page position of the event.
    pub fn page(&self) -> Point {
        match self {
            InputEvent::PointerDown(e) | InputEvent::PointerUp(e) | InputEvent::PointerMove(e) => e.page,
            InputEvent::Wheel(e) => e.page,
        }
    }

    /// Pointer ID, if the event belongs to a pointer contact.
    pub fn pointer_id(&self) -> Option<u32> {
        match self {
            InputEvent::PointerDown(e) | InputEvent::PointerUp(e) | InputEvent::PointerMove(e) => {
                Some(e.pointer_id)
            }
            InputEvent::Wheel(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        for ty in [
            EventType::PointerDown,
            EventType::PointerUp,
            EventType::PointerMove,
            EventType::Wheel,
        ] {
            assert_eq!(EventType::from_str(ty.as_str()), Some(ty));
        }
        assert_eq!(EventType::from_str("PointerDown"), Some(EventType::PointerDown));
        assert_eq!(EventType::from_str("click"), None);
    }

    #[test]
    fn test_event_accessors() {
        let down = InputEvent::PointerDown(PointerEvent::new(7, Point::new(10.0, 20.0)));
        assert_eq!(down.event_type(), EventType::PointerDown);
        assert_eq!(down.pointer_id(), Some(7));
        assert_eq!(down.page(), Point::new(10.0, 20.0));

        let wheel = InputEvent::Wheel(WheelEvent::new(Point::ZERO, 200.0));
        assert_eq!(wheel.pointer_id(), None);
    }
}
