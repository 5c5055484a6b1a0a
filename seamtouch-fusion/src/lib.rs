//! # seamtouch Fusion Library (seamtouch-fusion)
//!
//! Fuses touch reports from several edge-mounted sensors into one pointer
//! stream covering a single unified surface.
//!
//! **Pipeline:** map → history → debounce → lifecycle → deghost →
//! seam blend → smoothing, run on a single fusion thread fed by one
//! acquisition thread per sensor.

pub mod blend;
pub mod engine;
pub mod error;
pub mod filters;
pub mod history;
pub mod lifecycle;
pub mod mapper;
pub mod registry;
pub mod replay;
pub mod runtime;

pub use engine::{FusionEngine, FusionTuning};
pub use error::{Error, Result};
pub use registry::{GeometryRegistry, SurfaceLayout};
