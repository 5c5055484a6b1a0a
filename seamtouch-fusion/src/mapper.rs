//! Coordinate mapping
//!
//! Rewrites sensor-local coordinates into unified-surface coordinates. Each
//! (position, orientation) pair has one transform; transforms for anything
//! but the top-left sensor offset by the extents of already-registered
//! neighbours and subtract the seam overlap.
//!
//! Horizontal mounting (sensors along the top and bottom edges):
//!
//! | position     | X                      | Y                          |
//! |--------------|------------------------|----------------------------|
//! | top left     | x                      | y                          |
//! | top right    | TL.width + (w - x)     | y                          |
//! | bottom left  | x                      | (h - y) + TL.height - ov   |
//! | bottom right | BL.width + (w - x)     | (h - y) + TR.height - ov   |
//!
//! Vertical mounting (sensors along the left and right edges):
//!
//! | position     | X                          | Y                   |
//! |--------------|----------------------------|---------------------|
//! | top left     | y                          | x                   |
//! | top right    | (h - y) + TL.height - ov   | x                   |
//! | bottom left  | y                          | (w - x) + TL.width  |
//! | bottom right | (h - y) + BL.height - ov   | (w - x) + TR.width  |

use seamtouch_common::{SensorPosition, TouchSample};
use tracing::trace;

use crate::error::Result;
use crate::registry::GeometryRegistry;

/// Inputs a transform sees, widened so intermediate terms may go negative
struct Local<'a> {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    sample: &'a TouchSample,
    registry: &'a GeometryRegistry,
}

impl Local<'_> {
    fn overlap(&self) -> Result<i64> {
        Ok(i64::from(self.registry.overlap_along_seam(&self.sample.sensor)?))
    }

    fn neighbor_width(&self, neighbor: SensorPosition) -> Result<i64> {
        let geometry = self.registry.neighbor(self.sample.position(), neighbor)?;
        Ok(i64::from(geometry.width))
    }

    fn neighbor_height(&self, neighbor: SensorPosition) -> Result<i64> {
        let geometry = self.registry.neighbor(self.sample.position(), neighbor)?;
        Ok(i64::from(geometry.height))
    }
}

type Transform = fn(&Local<'_>) -> Result<(i64, i64)>;

fn horizontal_top_left(l: &Local<'_>) -> Result<(i64, i64)> {
    Ok((l.x, l.y))
}

fn horizontal_top_right(l: &Local<'_>) -> Result<(i64, i64)> {
    let tl_width = l.neighbor_width(SensorPosition::TopLeft)?;
    Ok((tl_width + (l.width - l.x), l.y))
}

fn horizontal_bottom_left(l: &Local<'_>) -> Result<(i64, i64)> {
    let tl_height = l.neighbor_height(SensorPosition::TopLeft)?;
    Ok((l.x, (l.height - l.y) + tl_height - l.overlap()?))
}

fn horizontal_bottom_right(l: &Local<'_>) -> Result<(i64, i64)> {
    let bl_width = l.neighbor_width(SensorPosition::BottomLeft)?;
    let tr_height = l.neighbor_height(SensorPosition::TopRight)?;
    Ok((bl_width + (l.width - l.x), (l.height - l.y) + tr_height - l.overlap()?))
}

fn vertical_top_left(l: &Local<'_>) -> Result<(i64, i64)> {
    Ok((l.y, l.x))
}

fn vertical_top_right(l: &Local<'_>) -> Result<(i64, i64)> {
    let tl_height = l.neighbor_height(SensorPosition::TopLeft)?;
    Ok(((l.height - l.y) + tl_height - l.overlap()?, l.x))
}

fn vertical_bottom_left(l: &Local<'_>) -> Result<(i64, i64)> {
    let tl_width = l.neighbor_width(SensorPosition::TopLeft)?;
    Ok((l.y, (l.width - l.x) + tl_width))
}

fn vertical_bottom_right(l: &Local<'_>) -> Result<(i64, i64)> {
    let bl_height = l.neighbor_height(SensorPosition::BottomLeft)?;
    let tr_width = l.neighbor_width(SensorPosition::TopRight)?;
    Ok(((l.height - l.y) + bl_height - l.overlap()?, (l.width - l.x) + tr_width))
}

/// Indexed by `SensorPosition::index()` then `MountingOrientation::index()`
const TRANSFORMS: [[Transform; 2]; 4] = [
    [horizontal_top_left, vertical_top_left],
    [horizontal_bottom_left, vertical_bottom_left],
    [horizontal_top_right, vertical_top_right],
    [horizontal_bottom_right, vertical_bottom_right],
];

fn clamp(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Map a sensor-local sample into unified-surface coordinates
///
/// Returns a new sample with the same event, timestamp and sensor. Fails
/// when a neighbour needed by the transform is not registered, or when the
/// seam overlap cannot be computed.
pub fn map(sample: &TouchSample, registry: &GeometryRegistry) -> Result<TouchSample> {
    let local = Local {
        x: i64::from(sample.x),
        y: i64::from(sample.y),
        width: i64::from(sample.sensor.width),
        height: i64::from(sample.sensor.height),
        sample,
        registry,
    };

    let transform = TRANSFORMS[sample.position().index()][registry.orientation().index()];
    let (x, y) = transform(&local)?;

    trace!(
        "Mapped {} ({}, {}) -> ({}, {})",
        sample.position(),
        sample.x,
        sample.y,
        x,
        y
    );

    let mut mapped = sample.clone();
    mapped.x = clamp(x);
    mapped.y = clamp(y);
    Ok(mapped)
}
