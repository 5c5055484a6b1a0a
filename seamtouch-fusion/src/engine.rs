//! Fusion engine
//!
//! Single-owner core of the fusion thread: geometry registry, touch history
//! and lifecycle state. Every raw sample is taken through
//! near-seam test → map → history → debounce → lifecycle → deghost →
//! seam blend → smoothing, and yields at most one fused sample.

use seamtouch_common::config::TuningConfig;
use seamtouch_common::{SensorGeometry, TouchSample};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::blend;
use crate::error::Result;
use crate::filters;
use crate::history::HistoryBuffer;
use crate::lifecycle::{Arbitration, Lifecycle, LifecycleState};
use crate::mapper;
use crate::registry::{GeometryRegistry, SurfaceLayout};

/// Filter thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct FusionTuning {
    pub debounce_interval_ms: u64,
    pub release_timeout: Duration,
    /// mm per ms
    pub ghost_speed_limit: f32,
    pub smoothing_window: usize,
    pub seam_weight: u32,
}

impl Default for FusionTuning {
    fn default() -> Self {
        Self::from(&TuningConfig::default())
    }
}

impl From<&TuningConfig> for FusionTuning {
    fn from(config: &TuningConfig) -> Self {
        Self {
            debounce_interval_ms: config.debounce_interval_ms,
            release_timeout: config.release_timeout(),
            ghost_speed_limit: config.ghost_speed_limit,
            smoothing_window: config.smoothing_window,
            seam_weight: config.seam_weight,
        }
    }
}

/// Running counters, logged when fusion stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub received: u64,
    pub emitted: u64,
    pub debounced: u64,
    pub held: u64,
    pub protocol_errors: u64,
    pub ghosts: u64,
    pub expired: u64,
}

#[derive(Debug)]
pub struct FusionEngine {
    registry: GeometryRegistry,
    history: HistoryBuffer,
    lifecycle: Lifecycle,
    tuning: FusionTuning,
    stats: FusionStats,
}

impl FusionEngine {
    pub fn new(layout: SurfaceLayout, tuning: FusionTuning) -> Self {
        Self {
            registry: GeometryRegistry::new(layout),
            history: HistoryBuffer::new(),
            lifecycle: Lifecycle::new(),
            tuning,
            stats: FusionStats::default(),
        }
    }

    pub fn register(&mut self, geometry: Arc<SensorGeometry>) -> Result<()> {
        self.registry.register(geometry)
    }

    pub fn is_complete(&self) -> bool {
        self.registry.is_complete()
    }

    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn stats(&self) -> FusionStats {
        self.stats
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Fuse one raw sensor-local sample
    ///
    /// `Ok(None)` means the sample was suppressed. Errors are configuration
    /// failures and must stop fusion.
    pub fn fuse(&mut self, raw: TouchSample) -> Result<Option<TouchSample>> {
        self.stats.received += 1;

        if !self.registry.is_complete() {
            debug!("Dropping {} touch from {}: sensors not configured", raw.event, raw.position());
            return Ok(None);
        }

        let near_seam = self.registry.is_near_seam(&raw)?;
        let mapped = mapper::map(&raw, &self.registry)?;
        self.history.push(mapped);

        if filters::debounce(&mut self.history, self.tuning.debounce_interval_ms).is_suppressed() {
            self.stats.debounced += 1;
            return Ok(None);
        }

        match self.lifecycle.arbitrate(&mut self.history, self.tuning.debounce_interval_ms) {
            Arbitration::Emit(_) => {}
            Arbitration::Suppressed => {
                self.stats.held += 1;
                return Ok(None);
            }
            Arbitration::ProtocolError => {
                self.stats.protocol_errors += 1;
                return Ok(None);
            }
        }

        if filters::deghost(&mut self.history, self.tuning.ghost_speed_limit).is_suppressed() {
            self.stats.ghosts += 1;
            return Ok(None);
        }

        let Some(latest) = self.history.latest() else {
            return Ok(None);
        };
        let start = if near_seam {
            blend::weighted_position(&self.history, self.tuning.seam_weight).unwrap_or((latest.x, latest.y))
        } else {
            (latest.x, latest.y)
        };
        let (x, y) = blend::smooth(&self.history, start, self.tuning.smoothing_window);

        let mut fused = latest.clone();
        fused.x = x;
        fused.y = y;

        trace!("Fused {} at ({}, {})", fused.event, fused.x, fused.y);
        self.stats.emitted += 1;
        Ok(Some(fused))
    }

    /// Release timeout to arm, if the last sample entered `UpPending`
    pub fn take_release_timeout(&mut self) -> Option<Duration> {
        self.lifecycle
            .take_release_request()
            .then_some(self.tuning.release_timeout)
    }

    /// Fire the release timeout
    ///
    /// Emits a synthetic `Up` at the newest sample's coordinates and
    /// timestamp when a release is still pending; no-op otherwise.
    pub fn expire(&mut self) -> Option<TouchSample> {
        if !self.lifecycle.expire(&mut self.history) {
            return None;
        }
        let released = self.history.latest().cloned()?;
        debug!("Release timeout fired at ({}, {})", released.x, released.y);
        self.stats.expired += 1;
        self.stats.emitted += 1;
        Some(released)
    }
}
