//! Scripted sensor replay
//!
//! Stands in for sensor hardware: a TOML scenario lists each sensor's
//! identity and the touches it reports, with offsets from its handshake.
//!
//! ```toml
//! [[sensors]]
//! hardware_id = "3F2A11C0"
//! width = 1000
//! height = 1600
//! slot = "top_left"
//! status = ["firmware 2.4"]
//!
//! [[sensors.touches]]
//! at_ms = 0
//! x = 500
//! y = 1400
//! event = "down"
//! ```

use serde::Deserialize;
use seamtouch_common::{SensorPosition, TouchEvent};
use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::Result;
use crate::runtime::{SensorIdentity, SensorReport, SensorSlot, SensorSource};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptedTouch {
    /// Offset from the sensor's handshake
    pub at_ms: u64,
    pub x: u32,
    pub y: u32,
    pub event: TouchEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedSensor {
    pub hardware_id: String,
    pub width: u32,
    pub height: u32,
    /// Acquisition slot, used as the default position
    pub slot: SensorPosition,
    /// Status lines reported right after the handshake
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub touches: Vec<ScriptedTouch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub sensors: Vec<ScriptedSensor>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self> {
        let mut scenario: Scenario = toml::from_str(content).map_err(seamtouch_common::Error::from)?;
        for sensor in &mut scenario.sensors {
            sensor.touches.sort_by_key(|t| t.at_ms);
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(seamtouch_common::Error::from)?;
        let scenario = Self::parse(&content)?;
        info!(
            "Loaded scenario {} ({} sensors)",
            path.display(),
            scenario.sensors.len()
        );
        Ok(scenario)
    }

    /// One acquisition slot per scripted sensor
    pub fn into_slots(self) -> Vec<SensorSlot> {
        self.sensors
            .into_iter()
            .map(|sensor| {
                let slot = sensor.slot;
                SensorSlot::new(slot, Box::new(ReplaySource::new(sensor)))
            })
            .collect()
    }
}

/// [`SensorSource`] that plays back one scripted sensor in real time
#[derive(Debug)]
pub struct ReplaySource {
    identity: SensorIdentity,
    status: VecDeque<String>,
    touches: VecDeque<ScriptedTouch>,
    started: Option<Instant>,
}

impl ReplaySource {
    pub fn new(sensor: ScriptedSensor) -> Self {
        Self {
            identity: SensorIdentity {
                hardware_id: sensor.hardware_id,
                width: sensor.width,
                height: sensor.height,
            },
            status: sensor.status.into(),
            touches: sensor.touches.into(),
            started: None,
        }
    }

    fn pop_touch(&mut self) -> Option<SensorReport> {
        self.touches
            .pop_front()
            .map(|t| SensorReport::Touch { x: t.x, y: t.y, event: t.event })
    }
}

impl SensorSource for ReplaySource {
    fn handshake(&mut self) -> Result<SensorIdentity> {
        self.started = Some(Instant::now());
        Ok(self.identity.clone())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<SensorReport>> {
        let started = *self.started.get_or_insert_with(Instant::now);

        if let Some(text) = self.status.pop_front() {
            return Ok(Some(SensorReport::Status(text)));
        }

        let Some(next) = self.touches.front() else {
            return Ok(Some(SensorReport::Closed));
        };

        let due = started + Duration::from_millis(next.at_ms);
        let wait = due.saturating_duration_since(Instant::now());
        if wait > timeout {
            std::thread::sleep(timeout);
            return Ok(None);
        }

        std::thread::sleep(wait);
        Ok(self.pop_touch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        [[sensors]]
        hardware_id = "AA01"
        width = 1000
        height = 1600
        slot = "top_left"
        status = ["firmware 2.4"]

        [[sensors.touches]]
        at_ms = 30
        x = 5
        y = 6
        event = "move"

        [[sensors.touches]]
        at_ms = 0
        x = 1
        y = 2
        event = "down"

        [[sensors]]
        hardware_id = "AA02"
        width = 1000
        height = 1600
        slot = "bottom_left"
    "#;

    #[test]
    fn test_parse_sorts_touches() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.sensors.len(), 2);

        let first = &scenario.sensors[0];
        assert_eq!(first.slot, SensorPosition::TopLeft);
        assert_eq!(first.touches[0].event, TouchEvent::Down);
        assert_eq!(first.touches[1].at_ms, 30);
        assert!(scenario.sensors[1].touches.is_empty());
    }

    #[test]
    fn test_bad_event_kind_rejected() {
        let bad = r#"
            [[sensors]]
            hardware_id = "AA01"
            width = 1000
            height = 1600
            slot = "top_left"
            [[sensors.touches]]
            at_ms = 0
            x = 1
            y = 2
            event = "tap"
        "#;
        assert!(Scenario::parse(bad).is_err());
    }

    #[test]
    fn test_replay_yields_status_then_touches_then_closed() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        let mut source = ReplaySource::new(scenario.sensors.remove(0));

        let identity = source.handshake().unwrap();
        assert_eq!(identity.hardware_id, "AA01");

        let poll = Duration::from_millis(500);
        assert_eq!(
            source.poll(poll).unwrap(),
            Some(SensorReport::Status("firmware 2.4".to_string()))
        );
        assert_eq!(
            source.poll(poll).unwrap(),
            Some(SensorReport::Touch { x: 1, y: 2, event: TouchEvent::Down })
        );
        assert_eq!(
            source.poll(poll).unwrap(),
            Some(SensorReport::Touch { x: 5, y: 6, event: TouchEvent::Move })
        );
        assert!(source.started.unwrap().elapsed() >= Duration::from_millis(30));
        assert_eq!(source.poll(poll).unwrap(), Some(SensorReport::Closed));
    }

    #[test]
    fn test_replay_poll_times_out_before_due() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        let mut source = ReplaySource::new(scenario.sensors.remove(0));
        source.handshake().unwrap();
        source.status.clear();
        source.touches.pop_front();

        assert_eq!(source.poll(Duration::from_millis(5)).unwrap(), None);
    }
}
