//! Presentation consumer
//!
//! Converts fused samples into absolute pointer reports and hands them to a
//! [`PointerSink`]. Output failures are never fatal.

use crossbeam::channel::Receiver;
use seamtouch_common::{TouchEvent, TouchSample};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::registry::SurfaceLayout;

/// Absolute pointer report, axes normalised to `0..=i16::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerReport {
    pub x: i16,
    pub y: i16,
    /// Primary button held
    pub pressed: bool,
    pub event: TouchEvent,
    pub timestamp_ms: u64,
}

impl PointerReport {
    pub fn from_sample(sample: &TouchSample, layout: &SurfaceLayout) -> Self {
        Self {
            x: normalize(sample.x, layout.width),
            y: normalize(sample.y, layout.height),
            pressed: sample.event.is_contact(),
            event: sample.event,
            timestamp_ms: sample.timestamp_ms,
        }
    }
}

fn normalize(value: u32, extent: u32) -> i16 {
    if extent == 0 {
        return 0;
    }
    let ratio = (value as f32 / extent as f32).min(1.0);
    (f32::from(i16::MAX) * ratio) as i16
}

/// Host pointer device
pub trait PointerSink: Send {
    fn emit(&mut self, report: &PointerReport) -> Result<()>;

    /// Re-create the device after an emit failure
    fn reopen(&mut self) -> Result<()>;
}

/// Sink that logs each report
#[derive(Debug, Default)]
pub struct TracingSink;

impl PointerSink for TracingSink {
    fn emit(&mut self, report: &PointerReport) -> Result<()> {
        info!(
            "pointer {} x={} y={} button={} t={}ms",
            report.event,
            report.x,
            report.y,
            if report.pressed { "down" } else { "up" },
            report.timestamp_ms
        );
        Ok(())
    }

    fn reopen(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct PresentationWorker {
    inbox: Receiver<TouchSample>,
    sink: Box<dyn PointerSink>,
    layout: SurfaceLayout,
}

impl PresentationWorker {
    pub fn new(inbox: Receiver<TouchSample>, sink: Box<dyn PointerSink>, layout: SurfaceLayout) -> Self {
        Self { inbox, sink, layout }
    }

    fn present(&mut self, report: &PointerReport) {
        let Err(first) = self.sink.emit(report) else {
            return;
        };
        warn!("Pointer emit failed: {}; reopening device", first);

        let retried = self.sink.reopen().and_then(|()| self.sink.emit(report));
        if let Err(e) = retried {
            error!("Pointer report dropped: {}", e);
        }
    }

    /// Runs until the fusion thread drops its sender
    pub fn run(mut self) {
        while let Ok(sample) = self.inbox.recv() {
            let report = PointerReport::from_sample(&sample, &self.layout);
            self.present(&report);
        }
        debug!("Presentation exiting");
    }
}
