//! Sensor positions, mounting orientation and active-area geometry
//!
//! ```text
//!    HORIZONTAL              VERTICAL
//!
//!  Top Left  Top Right    Top Left   Top Right
//!   _______  _______          _         _
//!  |c______||______c|        |c|       |c|
//!                            | |       | |
//!                            |_|       |_|
//!   _______  _______          _         _
//!  |c______||______c|        | |       | |
//!                            | |       | |
//!  Btm Left  Btm Right       |c|       |c|
//!
//!                         Btm Left   Btm Right
//! ```
//!
//! `c` marks the connector side of each sensor.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Quadrant a sensor is mounted at
///
/// Discriminants are the persisted position indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorPosition {
    TopLeft = 0,
    BottomLeft = 1,
    TopRight = 2,
    BottomRight = 3,
}

impl SensorPosition {
    /// All positions in index order
    pub const ALL: [SensorPosition; 4] = [
        SensorPosition::TopLeft,
        SensorPosition::BottomLeft,
        SensorPosition::TopRight,
        SensorPosition::BottomRight,
    ];

    /// Slot index (0..4), stable across releases
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SensorPosition::TopLeft => "top_left",
            SensorPosition::BottomLeft => "bottom_left",
            SensorPosition::TopRight => "top_right",
            SensorPosition::BottomRight => "bottom_right",
        }
    }

    /// Position mounted on the opposite edge along the seam axis
    ///
    /// Horizontal mounting pairs top and bottom within a column; vertical
    /// mounting pairs left and right within a row.
    pub fn opposite(self, orientation: MountingOrientation) -> SensorPosition {
        use SensorPosition::*;
        match (orientation, self) {
            (MountingOrientation::Horizontal, TopLeft) => BottomLeft,
            (MountingOrientation::Horizontal, BottomLeft) => TopLeft,
            (MountingOrientation::Horizontal, TopRight) => BottomRight,
            (MountingOrientation::Horizontal, BottomRight) => TopRight,
            (MountingOrientation::Vertical, TopLeft) => TopRight,
            (MountingOrientation::Vertical, TopRight) => TopLeft,
            (MountingOrientation::Vertical, BottomLeft) => BottomRight,
            (MountingOrientation::Vertical, BottomRight) => BottomLeft,
        }
    }
}

impl std::fmt::Display for SensorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorPosition::TopLeft => write!(f, "Top Left"),
            SensorPosition::BottomLeft => write!(f, "Bottom Left"),
            SensorPosition::TopRight => write!(f, "Top Right"),
            SensorPosition::BottomRight => write!(f, "Bottom Right"),
        }
    }
}

impl TryFrom<u8> for SensorPosition {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        SensorPosition::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::UnrecognizedPosition(value.to_string()))
    }
}

impl FromStr for SensorPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SensorPosition::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::UnrecognizedPosition(s.to_string()))
    }
}

/// Which screen edges the sensors are mounted along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountingOrientation {
    /// Sensors run parallel to the screen width (top and bottom edges)
    #[default]
    Horizontal = 0,
    /// Sensors run parallel to the screen height (left and right edges)
    Vertical = 1,
}

impl MountingOrientation {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for MountingOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MountingOrientation::Horizontal => write!(f, "horizontal"),
            MountingOrientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// Active-area geometry of one sensor
///
/// Created once per sensor when its handshake completes and never modified
/// afterwards. Lengths are in device units (1/10 mm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorGeometry {
    pub position: SensorPosition,
    pub width: u32,
    pub height: u32,
    /// Stable hardware identifier (MCU unique id, hex encoded)
    pub hardware_id: String,
}

impl SensorGeometry {
    pub fn new(position: SensorPosition, width: u32, height: u32, hardware_id: impl Into<String>) -> Self {
        Self {
            position,
            width,
            height,
            hardware_id: hardware_id.into(),
        }
    }
}
