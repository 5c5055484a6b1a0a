//! Seam blending and smoothing
//!
//! Neither stage writes back into history; both work on the coordinates of
//! the newest entry and hand the result to the caller.

use seamtouch_common::TouchEvent;
use tracing::debug;

use crate::history::HistoryBuffer;

/// Blend the newest sample toward the most recent sample from another sensor
///
/// Used near a seam, where the opposite sensor is the better witness:
/// `X = (X + w * Xo) / (w + 1)`, same for `Y`. The newest sample's
/// coordinates are returned unchanged when no other sensor has reported,
/// or when its latest report is a release.
pub fn weighted_position(history: &HistoryBuffer, weight: u32) -> Option<(u32, u32)> {
    let latest = history.latest()?;
    let position = latest.position();

    let Some(other) = history.find_previous(|s| s.position() != position) else {
        return Some((latest.x, latest.y));
    };
    if other.event == TouchEvent::Up {
        return Some((latest.x, latest.y));
    }

    let w = u64::from(weight);
    let blend = |own: u32, theirs: u32| ((u64::from(own) + w * u64::from(theirs)) / (w + 1)) as u32;
    let blended = (blend(latest.x, other.x), blend(latest.y, other.y));

    debug!(
        "Seam blend {} ({}, {}) with {} ({}, {}) -> ({}, {})",
        position,
        latest.x,
        latest.y,
        other.position(),
        other.x,
        other.y,
        blended.0,
        blended.1
    );

    Some(blended)
}

/// Rolling average of `start` and up to `window - 1` earlier contact samples
///
/// Walks history from the sample before the newest and stops at the first
/// entry that is neither `Down` nor `Move`.
pub fn smooth(history: &HistoryBuffer, start: (u32, u32), window: usize) -> (u32, u32) {
    let mut x_total = u64::from(start.0);
    let mut y_total = u64::from(start.1);
    let mut samples = 1u64;

    for sample in history
        .iter_recent()
        .skip(1)
        .take(window.saturating_sub(1))
        .take_while(|s| s.event.is_contact())
    {
        x_total += u64::from(sample.x);
        y_total += u64::from(sample.y);
        samples += 1;
    }

    ((x_total / samples) as u32, (y_total / samples) as u32)
}
