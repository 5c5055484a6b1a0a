//! Thread topology
//!
//! ```text
//! acquire-<position> ──┐
//! acquire-<position> ──┼─▶ fusion ──▶ presentation ──▶ PointerSink
//!          ...         │     │
//!                      └─────┴──▶ control
//! ```
//!
//! The fusion thread owns all fusion state; bounded queues are the only
//! shared resources.

pub mod acquisition;
pub mod control;
pub mod fusion_worker;
pub mod messages;
pub mod presentation;
pub mod shutdown;

pub use acquisition::{SensorIdentity, SensorReport, SensorSlot, SensorSource};
pub use presentation::{PointerReport, PointerSink, TracingSink};
pub use shutdown::ShutdownSignal;

use crossbeam::channel::bounded;
use seamtouch_common::config::FusionConfig;
use seamtouch_common::positions::PositionAssignments;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::engine::{FusionEngine, FusionTuning};
use crate::error::{Error, Result};
use crate::registry::SurfaceLayout;
use acquisition::AcquisitionWorker;
use control::ControlWorker;
use fusion_worker::FusionWorker;
use presentation::PresentationWorker;

/// Running pipeline threads
pub struct Pipeline {
    threads: Vec<(String, JoinHandle<()>)>,
    shutdown: ShutdownSignal,
}

fn spawn<F>(name: String, body: F) -> Result<(String, JoinHandle<()>)>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .map_err(|e| Error::Thread(format!("failed to spawn {}: {}", name, e)))?;
    Ok((name, handle))
}

/// Run a worker body, recording fatal errors on the shutdown signal
fn supervise(name: &str, shutdown: &ShutdownSignal, result: Result<()>) {
    match result {
        Ok(()) => debug!("{} finished", name),
        Err(e) if e.is_fatal() => shutdown.fail(e),
        Err(e) => error!("{} stopped: {}", name, e),
    }
}

impl Pipeline {
    /// Spawn every pipeline thread
    ///
    /// `assignments` is the positions file as loaded at startup; the control
    /// thread rewrites `config.positions_file` when it turns out stale.
    pub fn start(
        config: &FusionConfig,
        sensors: Vec<SensorSlot>,
        sink: Box<dyn PointerSink>,
        assignments: Option<PositionAssignments>,
    ) -> Result<Self> {
        let shutdown = ShutdownSignal::new();
        let layout = SurfaceLayout::from_config(config);
        let assignments = assignments.map(Arc::new);
        let epoch = Instant::now();
        let poll_interval = config.poll_interval();

        let (fusion_tx, fusion_rx) = bounded(config.queue_capacity);
        let (output_tx, output_rx) = bounded(config.queue_capacity);
        let (control_tx, control_rx) = bounded(config.queue_capacity);

        let mut threads = Vec::with_capacity(sensors.len() + 3);

        let control = ControlWorker::new(control_rx, config.positions_file.clone(), assignments.clone());
        threads.push(spawn("control".to_string(), move || control.run())?);

        let presentation = PresentationWorker::new(output_rx, sink, layout.clone());
        threads.push(spawn("presentation".to_string(), move || presentation.run())?);

        let engine = FusionEngine::new(layout, FusionTuning::from(&config.tuning));
        let fusion = FusionWorker::new(
            engine,
            fusion_rx,
            output_tx,
            control_tx.clone(),
            shutdown.clone(),
            poll_interval,
        );
        let signal = shutdown.clone();
        threads.push(spawn("fusion".to_string(), move || {
            supervise("fusion", &signal, fusion.run());
        })?);

        for slot in sensors {
            let name = format!("acquire-{}", slot.default_position.as_str());
            let worker = AcquisitionWorker::new(
                slot,
                assignments.clone(),
                fusion_tx.clone(),
                control_tx.clone(),
                shutdown.clone(),
                epoch,
                poll_interval,
            );
            let signal = shutdown.clone();
            let label = name.clone();
            threads.push(spawn(name, move || {
                supervise(&label, &signal, worker.run());
            })?);
        }

        info!("Pipeline started with {} threads", threads.len());

        Ok(Self { threads, shutdown })
    }

    /// Handle for requesting a cooperative stop from outside
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Wait for every thread and return the first fatal error, if any
    pub fn join(self) -> Result<()> {
        let mut panicked = None;

        for (name, handle) in self.threads {
            if handle.join().is_err() {
                error!("Thread {} panicked", name);
                self.shutdown.request();
                panicked.get_or_insert_with(|| Error::Thread(format!("{} panicked", name)));
            }
        }

        info!("Pipeline stopped");

        match self.shutdown.take_fatal().or(panicked) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
