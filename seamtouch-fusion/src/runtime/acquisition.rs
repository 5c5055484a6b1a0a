//! Per-sensor acquisition
//!
//! One thread per sensor: handshake, resolve the sensor's position, publish
//! its geometry, then timestamp and forward every touch until the source
//! closes or shutdown is requested.

use crossbeam::channel::Sender;
use seamtouch_common::positions::PositionAssignments;
use seamtouch_common::{SensorGeometry, SensorPosition, TouchEvent, TouchSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::messages::{offer, ControlMessage, FusionMessage};
use super::shutdown::ShutdownSignal;
use crate::error::{Error, Result};

/// What a sensor reports about itself after connecting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorIdentity {
    pub hardware_id: String,
    /// Active-area width, 1/10 mm
    pub width: u32,
    /// Active-area height, 1/10 mm
    pub height: u32,
}

/// One report read from a sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorReport {
    /// Sensor-local touch
    Touch { x: u32, y: u32, event: TouchEvent },
    /// Non-touch status traffic
    Status(String),
    /// The sensor will send nothing more
    Closed,
}

/// Transport boundary to one physical (or scripted) sensor
pub trait SensorSource: Send {
    /// Connect and read the sensor's identity and active area
    fn handshake(&mut self) -> Result<SensorIdentity>;

    /// Wait up to `timeout` for the next report
    fn poll(&mut self, timeout: Duration) -> Result<Option<SensorReport>>;
}

/// A sensor source bound to an acquisition slot
pub struct SensorSlot {
    /// Position used when the sensor is not in the positions file
    pub default_position: SensorPosition,
    pub source: Box<dyn SensorSource>,
}

impl SensorSlot {
    pub fn new(default_position: SensorPosition, source: Box<dyn SensorSource>) -> Self {
        Self {
            default_position,
            source,
        }
    }
}

pub struct AcquisitionWorker {
    slot: SensorSlot,
    assignments: Option<Arc<PositionAssignments>>,
    fusion_tx: Sender<FusionMessage>,
    control_tx: Sender<ControlMessage>,
    shutdown: ShutdownSignal,
    epoch: Instant,
    poll_interval: Duration,
}

impl AcquisitionWorker {
    pub fn new(
        slot: SensorSlot,
        assignments: Option<Arc<PositionAssignments>>,
        fusion_tx: Sender<FusionMessage>,
        control_tx: Sender<ControlMessage>,
        shutdown: ShutdownSignal,
        epoch: Instant,
        poll_interval: Duration,
    ) -> Self {
        Self {
            slot,
            assignments,
            fusion_tx,
            control_tx,
            shutdown,
            epoch,
            poll_interval,
        }
    }

    /// Persisted position for a hardware id, else this slot's default
    fn resolve_position(&self, hardware_id: &str) -> SensorPosition {
        let Some(assignments) = &self.assignments else {
            return self.slot.default_position;
        };

        match assignments.resolve(hardware_id) {
            Some(position) => position,
            None => {
                warn!(
                    "Sensor {} not found in positions file, assigning {}",
                    hardware_id, self.slot.default_position
                );
                self.slot.default_position
            }
        }
    }

    fn timestamp_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn run(mut self) -> Result<()> {
        let identity = self
            .slot
            .source
            .handshake()
            .map_err(|e| Error::Transport(format!("handshake failed for {}: {}", self.slot.default_position, e)))?;

        let position = self.resolve_position(&identity.hardware_id);
        let geometry = Arc::new(SensorGeometry::new(
            position,
            identity.width,
            identity.height,
            identity.hardware_id,
        ));

        info!(
            "Sensor {} connected at {} ({}x{})",
            geometry.hardware_id, position, geometry.width, geometry.height
        );

        // Fusion never completes its registry without this, so wait for room
        if self
            .fusion_tx
            .send(FusionMessage::SensorReady(Arc::clone(&geometry)))
            .is_err()
        {
            return Err(Error::Queue(format!("could not publish configuration for {}", position)));
        }

        while !self.shutdown.is_requested() {
            match self.slot.source.poll(self.poll_interval)? {
                Some(SensorReport::Touch { x, y, event }) => {
                    let sample = TouchSample::new(x, y, event, self.timestamp_ms(), Arc::clone(&geometry));
                    offer(&self.fusion_tx, FusionMessage::Touch(sample), "fusion");
                }
                Some(SensorReport::Status(text)) => {
                    offer(&self.control_tx, ControlMessage::Status { position, text }, "control");
                }
                Some(SensorReport::Closed) => {
                    info!("Sensor {} at {} closed", geometry.hardware_id, position);
                    break;
                }
                None => {}
            }
        }

        debug!("Acquisition for {} exiting", position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::bounded;
    use std::collections::VecDeque;

    struct ScriptedSource {
        identity: Option<SensorIdentity>,
        reports: VecDeque<SensorReport>,
    }

    impl SensorSource for ScriptedSource {
        fn handshake(&mut self) -> Result<SensorIdentity> {
            self.identity
                .clone()
                .ok_or_else(|| Error::Transport("no response".to_string()))
        }

        fn poll(&mut self, _timeout: Duration) -> Result<Option<SensorReport>> {
            Ok(Some(self.reports.pop_front().unwrap_or(SensorReport::Closed)))
        }
    }

    fn worker(
        source: ScriptedSource,
        assignments: Option<PositionAssignments>,
    ) -> (
        AcquisitionWorker,
        crossbeam::channel::Receiver<FusionMessage>,
        crossbeam::channel::Receiver<ControlMessage>,
    ) {
        let (fusion_tx, fusion_rx) = bounded(16);
        let (control_tx, control_rx) = bounded(16);
        let worker = AcquisitionWorker::new(
            SensorSlot::new(SensorPosition::BottomLeft, Box::new(source)),
            assignments.map(Arc::new),
            fusion_tx,
            control_tx,
            ShutdownSignal::new(),
            Instant::now(),
            Duration::from_millis(5),
        );
        (worker, fusion_rx, control_rx)
    }

    fn identity(id: &str) -> SensorIdentity {
        SensorIdentity {
            hardware_id: id.to_string(),
            width: 1000,
            height: 1600,
        }
    }

    #[test]
    fn test_publishes_geometry_then_touches() {
        let source = ScriptedSource {
            identity: Some(identity("AB01")),
            reports: VecDeque::from([
                SensorReport::Status("firmware 2.1".to_string()),
                SensorReport::Touch {
                    x: 10,
                    y: 20,
                    event: TouchEvent::Down,
                },
            ]),
        };
        let (worker, fusion_rx, control_rx) = worker(source, None);
        worker.run().unwrap();

        let ready = fusion_rx.try_recv().unwrap();
        match ready {
            FusionMessage::SensorReady(geometry) => {
                assert_eq!(geometry.position, SensorPosition::BottomLeft);
                assert_eq!(geometry.hardware_id, "AB01");
            }
            other => panic!("expected SensorReady, got {other:?}"),
        }

        match fusion_rx.try_recv().unwrap() {
            FusionMessage::Touch(sample) => {
                assert_eq!((sample.x, sample.y, sample.event), (10, 20, TouchEvent::Down));
                assert_eq!(sample.position(), SensorPosition::BottomLeft);
            }
            other => panic!("expected Touch, got {other:?}"),
        }

        assert!(matches!(
            control_rx.try_recv().unwrap(),
            ControlMessage::Status { position: SensorPosition::BottomLeft, .. }
        ));
    }

    #[test]
    fn test_persisted_position_overrides_slot_default() {
        let source = ScriptedSource {
            identity: Some(identity("AB01")),
            reports: VecDeque::new(),
        };
        let assignments = PositionAssignments::parse("2,AB01\n").unwrap();
        let (worker, fusion_rx, _control_rx) = worker(source, Some(assignments));
        worker.run().unwrap();

        match fusion_rx.try_recv().unwrap() {
            FusionMessage::SensorReady(geometry) => assert_eq!(geometry.position, SensorPosition::TopRight),
            other => panic!("expected SensorReady, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_sensor_uses_slot_default() {
        let source = ScriptedSource {
            identity: Some(identity("FFFF")),
            reports: VecDeque::new(),
        };
        let assignments = PositionAssignments::parse("2,AB01\n").unwrap();
        let (worker, fusion_rx, _control_rx) = worker(source, Some(assignments));
        worker.run().unwrap();

        match fusion_rx.try_recv().unwrap() {
            FusionMessage::SensorReady(geometry) => assert_eq!(geometry.position, SensorPosition::BottomLeft),
            other => panic!("expected SensorReady, got {other:?}"),
        }
    }

    #[test]
    fn test_configuration_waits_for_full_fusion_queue() {
        let source = ScriptedSource {
            identity: Some(identity("AB01")),
            reports: VecDeque::new(),
        };
        let (fusion_tx, fusion_rx) = bounded(1);
        let (control_tx, _control_rx) = bounded(16);

        // Occupy the only slot so the geometry cannot be queued yet
        let filler = Arc::new(SensorGeometry::new(SensorPosition::TopLeft, 1000, 1600, "AA00"));
        fusion_tx.send(FusionMessage::SensorReady(filler)).unwrap();

        let worker = AcquisitionWorker::new(
            SensorSlot::new(SensorPosition::BottomLeft, Box::new(source)),
            None,
            fusion_tx,
            control_tx,
            ShutdownSignal::new(),
            Instant::now(),
            Duration::from_millis(5),
        );
        let handle = std::thread::spawn(move || worker.run());

        std::thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        fusion_rx.recv().unwrap();
        match fusion_rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            FusionMessage::SensorReady(geometry) => assert_eq!(geometry.hardware_id, "AB01"),
            other => panic!("expected SensorReady, got {other:?}"),
        }
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_configuration_fails_once_fusion_is_gone() {
        let source = ScriptedSource {
            identity: Some(identity("AB01")),
            reports: VecDeque::new(),
        };
        let (worker, fusion_rx, _control_rx) = worker(source, None);
        drop(fusion_rx);

        let err = worker.run().unwrap_err();
        assert!(matches!(err, Error::Queue(_)));
    }

    #[test]
    fn test_handshake_failure_is_transport_error() {
        let source = ScriptedSource {
            identity: None,
            reports: VecDeque::new(),
        };
        let (worker, _fusion_rx, _control_rx) = worker(source, None);
        let err = worker.run().unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_fatal());
    }
}
