//! Sensor geometry registry
//!
//! Holds one geometry per quadrant position and answers the adjacency and
//! overlap questions the mapper and the seam blender ask. Owned by the fusion
//! thread; other threads only ever see cloned `Arc<SensorGeometry>` handles.

use seamtouch_common::config::FusionConfig;
use seamtouch_common::{MountingOrientation, SensorGeometry, SensorPosition, TouchSample};
use std::sync::Arc;
use tracing::info;

use crate::error::{Error, Result};

/// Unified surface description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub orientation: MountingOrientation,
    /// Unified surface width in device units
    pub width: u32,
    /// Unified surface height in device units
    pub height: u32,
    /// Positions that must register before fusion may run
    pub expected: Vec<SensorPosition>,
}

impl SurfaceLayout {
    pub fn new(orientation: MountingOrientation, width: u32, height: u32, expected: Vec<SensorPosition>) -> Self {
        Self {
            orientation,
            width,
            height,
            expected,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(
            config.orientation,
            config.surface_width,
            config.surface_height,
            config.sensors.clone(),
        )
    }

    /// Total surface extent along the axis the seam runs across
    pub fn seam_extent(&self) -> u32 {
        match self.orientation {
            MountingOrientation::Horizontal => self.height,
            MountingOrientation::Vertical => self.width,
        }
    }
}

/// Sensor configuration set keyed by position
#[derive(Debug)]
pub struct GeometryRegistry {
    layout: SurfaceLayout,
    slots: [Option<Arc<SensorGeometry>>; 4],
    complete: bool,
}

impl GeometryRegistry {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            slots: Default::default(),
            complete: false,
        }
    }

    pub fn orientation(&self) -> MountingOrientation {
        self.layout.orientation
    }

    /// Store a sensor's geometry
    ///
    /// Fails with `DuplicatePosition` when the position is already occupied.
    /// Registration order across sensors does not matter.
    pub fn register(&mut self, geometry: Arc<SensorGeometry>) -> Result<()> {
        let position = geometry.position;

        if self.slots[position.index()].is_some() {
            return Err(Error::DuplicatePosition(position));
        }

        if !self.layout.expected.contains(&position) {
            return Err(Error::Common(seamtouch_common::Error::Config(format!(
                "sensor {} reported position {} which is not in the expected sensor set",
                geometry.hardware_id, position
            ))));
        }

        info!(
            "Configuration for sensor position {}: width={} height={} id={}",
            position, geometry.width, geometry.height, geometry.hardware_id
        );

        self.slots[position.index()] = Some(geometry);

        if !self.complete && self.layout.expected.iter().all(|p| self.slots[p.index()].is_some()) {
            self.complete = true;
            info!("Sensor configurations done ({} sensors)", self.layout.expected.len());
        }

        Ok(())
    }

    pub fn lookup(&self, position: SensorPosition) -> Option<&Arc<SensorGeometry>> {
        self.slots[position.index()].as_ref()
    }

    /// Lookup that treats absence as a mapping failure
    pub fn neighbor(&self, of: SensorPosition, neighbor: SensorPosition) -> Result<&Arc<SensorGeometry>> {
        self.lookup(neighbor).ok_or(Error::UnresolvedNeighbor {
            position: of,
            neighbor,
        })
    }

    pub fn opposite_of(&self, geometry: &SensorGeometry) -> Option<&Arc<SensorGeometry>> {
        self.lookup(geometry.position.opposite(self.layout.orientation))
    }

    /// Overlap between a sensor and its opposite along the seam axis
    ///
    /// `overlap = total_extent - extent - opposite_extent`; a positive value
    /// is a gap between the active areas and is fatal.
    pub fn overlap_along_seam(&self, geometry: &SensorGeometry) -> Result<u32> {
        let opposite = self
            .opposite_of(geometry)
            .ok_or(Error::MissingOpposite(geometry.position))?;

        let total = i64::from(self.layout.seam_extent());
        let signed = total - i64::from(geometry.height) - i64::from(opposite.height);

        if signed > 0 {
            return Err(Error::SeamGap {
                position: geometry.position,
                gap: signed as u32,
            });
        }

        Ok(signed.unsigned_abs() as u32)
    }

    /// Whether a sensor-local sample lies in the half of the overlap closer
    /// to the opposite sensor
    pub fn is_near_seam(&self, sample: &TouchSample) -> Result<bool> {
        let overlap = self.overlap_along_seam(&sample.sensor)?;
        let threshold = i64::from(sample.sensor.height) - i64::from(overlap / 2);
        Ok(i64::from(sample.y) > threshold)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Registered geometries in position index order
    pub fn geometries(&self) -> impl Iterator<Item = &Arc<SensorGeometry>> {
        self.slots.iter().flatten()
    }
}
