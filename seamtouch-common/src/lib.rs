//! # seamtouch Common Library
//!
//! Shared code for the seamtouch fusion service including:
//! - Sensor data model (positions, mounting orientation, geometry)
//! - Touch samples and event kinds
//! - Bootstrap configuration loading
//! - Persisted sensor position assignments

pub mod config;
pub mod error;
pub mod positions;
pub mod sensor;
pub mod touch;

pub use error::{Error, Result};
pub use sensor::{MountingOrientation, SensorGeometry, SensorPosition};
pub use touch::{TouchEvent, TouchSample};
