//! Touch samples flowing through the fusion pipeline

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::sensor::{SensorGeometry, SensorPosition};

/// Event kind carried by a touch sample
///
/// Sensors only report `Down`, `Move`, `Up`, `Invalid` and `Ghost`; the
/// pending kinds exist for the fusion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchEvent {
    /// New touch object detected
    Down,
    /// The touch object is moving
    Move,
    /// The touch object is no longer detected
    Up,
    /// Invalid event reported by the sensor
    Invalid,
    /// Ghost touch reported by the sensor
    Ghost,
    DownPending,
    UpPending,
}

impl TouchEvent {
    /// True for kinds that describe an ongoing contact
    pub fn is_contact(self) -> bool {
        matches!(self, TouchEvent::Down | TouchEvent::Move)
    }
}

impl std::fmt::Display for TouchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TouchEvent::Down => "down",
            TouchEvent::Move => "move",
            TouchEvent::Up => "up",
            TouchEvent::Invalid => "invalid",
            TouchEvent::Ghost => "ghost",
            TouchEvent::DownPending => "down-pending",
            TouchEvent::UpPending => "up-pending",
        };
        f.write_str(name)
    }
}

/// One touch report
///
/// Coordinates are sensor-local until the mapper rewrites them into
/// unified-surface coordinates. The originating geometry is shared, never
/// copied per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchSample {
    pub x: u32,
    pub y: u32,
    pub event: TouchEvent,
    /// Monotonic arrival time in milliseconds
    pub timestamp_ms: u64,
    pub sensor: Arc<SensorGeometry>,
}

impl TouchSample {
    pub fn new(x: u32, y: u32, event: TouchEvent, timestamp_ms: u64, sensor: Arc<SensorGeometry>) -> Self {
        Self {
            x,
            y,
            event,
            timestamp_ms,
            sensor,
        }
    }

    pub fn position(&self) -> SensorPosition {
        self.sensor.position
    }

    /// Milliseconds between `earlier` and this sample, zero if `earlier` is newer
    pub fn elapsed_since(&self, earlier: &TouchSample) -> u64 {
        self.timestamp_ms.saturating_sub(earlier.timestamp_ms)
    }

    pub fn same_coordinates(&self, other: &TouchSample) -> bool {
        self.x == other.x && self.y == other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Arc<SensorGeometry> {
        Arc::new(SensorGeometry::new(SensorPosition::TopLeft, 1000, 1600, "A1"))
    }

    #[test]
    fn test_elapsed_since_saturates() {
        let sensor = geometry();
        let early = TouchSample::new(0, 0, TouchEvent::Down, 100, Arc::clone(&sensor));
        let late = TouchSample::new(0, 0, TouchEvent::Move, 160, sensor);
        assert_eq!(late.elapsed_since(&early), 60);
        // Cross-sensor timestamps may arrive out of order
        assert_eq!(early.elapsed_since(&late), 0);
    }

    #[test]
    fn test_is_contact() {
        assert!(TouchEvent::Down.is_contact());
        assert!(TouchEvent::Move.is_contact());
        assert!(!TouchEvent::Up.is_contact());
        assert!(!TouchEvent::Ghost.is_contact());
        assert!(!TouchEvent::UpPending.is_contact());
    }

    #[test]
    fn test_event_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            event: TouchEvent,
        }
        let parsed: Wrapper = toml::from_str("event = \"down_pending\"").unwrap();
        assert_eq!(parsed.event, TouchEvent::DownPending);
    }
}
