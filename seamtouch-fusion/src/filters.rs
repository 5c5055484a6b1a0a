//! Rejection filters: debounce and deghost
//!
//! Both act on the newest history entry. A suppressed sample never reaches
//! the pointer output; suppression is a normal outcome, not an error.

use tracing::debug;

use crate::history::HistoryBuffer;
use seamtouch_common::TouchEvent;

/// Device units per millimetre
const UNITS_PER_MM: f32 = 10.0;

/// Gaps above this are worth a debug line when deghosting
const DEGHOST_LOG_GAP_MS: u64 = 100;

/// Outcome of a filter stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Suppressed,
}

impl Verdict {
    pub fn is_suppressed(self) -> bool {
        self == Verdict::Suppressed
    }
}

/// Collapse a quick release/re-press (or press/release) into a move
///
/// Finds the most recent earlier sample whose kind differs from the newest.
/// When that sample is less than `interval_ms` old and the pair is
/// Down→Up or Up→Down, the newest entry becomes a `Move` and is suppressed.
pub fn debounce(history: &mut HistoryBuffer, interval_ms: u64) -> Verdict {
    let Some(latest) = history.latest() else {
        return Verdict::Pass;
    };
    let kind = latest.event;

    let Some(earlier) = history.find_previous(|s| s.event != kind) else {
        return Verdict::Pass;
    };

    let gap = latest.elapsed_since(earlier);
    let bounced = matches!(
        (earlier.event, kind),
        (TouchEvent::Down, TouchEvent::Up) | (TouchEvent::Up, TouchEvent::Down)
    );

    if gap >= interval_ms || !bounced {
        return Verdict::Pass;
    }

    debug!("Debounced {} after {} ({} ms apart)", kind, earlier.event, gap);

    if let Some(latest) = history.latest_mut() {
        latest.event = TouchEvent::Move;
    }
    Verdict::Suppressed
}

/// Reject samples implying a physically impossible finger speed
///
/// Speed is in mm/ms between the newest two samples; elapsed time is
/// floored at 1 ms. A rejected sample is removed from history. `Up`
/// samples are never checked.
pub fn deghost(history: &mut HistoryBuffer, speed_limit: f32) -> Verdict {
    let (Some(latest), Some(previous)) = (history.latest(), history.previous()) else {
        return Verdict::Pass;
    };

    if latest.event == TouchEvent::Up || latest.same_coordinates(previous) {
        return Verdict::Pass;
    }

    let dx = latest.x as f32 - previous.x as f32;
    let dy = latest.y as f32 - previous.y as f32;
    let distance_mm = (dx * dx + dy * dy).sqrt() / UNITS_PER_MM;
    let elapsed_ms = latest.elapsed_since(previous).max(1);
    let speed = distance_mm / elapsed_ms as f32;

    if elapsed_ms > DEGHOST_LOG_GAP_MS || (distance_mm > 0.0 && latest.event != TouchEvent::Down) {
        debug!(
            "Deghost {}: {:.1} mm in {} ms ({:.2} mm/ms)",
            latest.event, distance_mm, elapsed_ms, speed
        );
    }

    if speed > speed_limit {
        debug!(
            "Ghost rejected at ({}, {}): {:.2} mm/ms exceeds {:.2}",
            latest.x, latest.y, speed, speed_limit
        );
        history.retract_latest();
        return Verdict::Suppressed;
    }

    Verdict::Pass
}
