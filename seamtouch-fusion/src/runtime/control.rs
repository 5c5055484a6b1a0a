//! Control consumer
//!
//! Logs sensor status traffic and writes the positions file back once the
//! sensor set is complete, if what was loaded at startup is missing or no
//! longer matches.

use crossbeam::channel::Receiver;
use seamtouch_common::positions::PositionAssignments;
use seamtouch_common::SensorGeometry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::messages::ControlMessage;
use crate::error::Result;

pub struct ControlWorker {
    inbox: Receiver<ControlMessage>,
    positions_file: Option<PathBuf>,
    loaded: Option<Arc<PositionAssignments>>,
}

impl ControlWorker {
    pub fn new(
        inbox: Receiver<ControlMessage>,
        positions_file: Option<PathBuf>,
        loaded: Option<Arc<PositionAssignments>>,
    ) -> Self {
        Self {
            inbox,
            positions_file,
            loaded,
        }
    }

    fn write_back(&mut self, geometries: &[Arc<SensorGeometry>]) -> Result<()> {
        let Some(path) = &self.positions_file else {
            return Ok(());
        };

        let current = PositionAssignments::from_geometries(geometries.iter().map(|g| g.as_ref()))?;
        if self.loaded.as_deref() == Some(&current) {
            debug!("Positions file {} is current", path.display());
            return Ok(());
        }

        current.save(path)?;
        info!("Saved {} sensor positions to {}", current.len(), path.display());
        self.loaded = Some(Arc::new(current));
        Ok(())
    }

    /// Runs until every producer has dropped its sender
    pub fn run(mut self) {
        while let Ok(message) = self.inbox.recv() {
            match message {
                ControlMessage::Status { position, text } => {
                    info!("Sensor {}: {}", position, text);
                }
                ControlMessage::ConfigurationComplete(geometries) => {
                    if let Err(e) = self.write_back(&geometries) {
                        warn!("Could not save sensor positions: {}", e);
                    }
                }
            }
        }
        debug!("Control exiting");
    }
}
