//! Fusion consumer
//!
//! Sole owner of the fusion engine. Drains the fusion queue, waking early
//! when a release deadline is armed, and forwards fused samples to the
//! presentation queue.

use crossbeam::channel::{Receiver, Sender};
use seamtouch_common::TouchSample;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::messages::{self, offer, ControlMessage, FusionMessage, Inbound};
use super::shutdown::ShutdownSignal;
use crate::engine::FusionEngine;
use crate::error::Result;

pub struct FusionWorker {
    engine: FusionEngine,
    inbox: Receiver<FusionMessage>,
    output_tx: Sender<TouchSample>,
    control_tx: Sender<ControlMessage>,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
    release_deadline: Option<Instant>,
}

impl FusionWorker {
    pub fn new(
        engine: FusionEngine,
        inbox: Receiver<FusionMessage>,
        output_tx: Sender<TouchSample>,
        control_tx: Sender<ControlMessage>,
        shutdown: ShutdownSignal,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            inbox,
            output_tx,
            control_tx,
            shutdown,
            poll_interval,
            release_deadline: None,
        }
    }

    fn forward(&self, sample: TouchSample) {
        offer(&self.output_tx, sample, "presentation");
    }

    fn handle(&mut self, message: FusionMessage) -> Result<()> {
        // Any message consumes an armed release deadline
        self.release_deadline = None;

        match message {
            FusionMessage::SensorReady(geometry) => {
                let was_complete = self.engine.is_complete();
                self.engine.register(geometry)?;

                if !was_complete && self.engine.is_complete() {
                    let geometries = self.engine.registry().geometries().cloned().collect();
                    offer(
                        &self.control_tx,
                        ControlMessage::ConfigurationComplete(geometries),
                        "control",
                    );
                }
            }
            FusionMessage::Touch(raw) => {
                if let Some(fused) = self.engine.fuse(raw)? {
                    self.forward(fused);
                }
                if let Some(timeout) = self.engine.take_release_timeout() {
                    self.release_deadline = Some(Instant::now() + timeout);
                }
            }
        }

        Ok(())
    }

    fn expire(&mut self) {
        self.release_deadline = None;
        if let Some(released) = self.engine.expire() {
            self.forward(released);
        }
    }

    pub fn run(mut self) -> Result<()> {
        info!("Fusion started");

        loop {
            if self.shutdown.is_requested() {
                // Producers have been told to stop; take what is already queued
                while let Ok(message) = self.inbox.try_recv() {
                    self.handle(message)?;
                }
                // Never leave the host holding a press
                self.expire();
                break;
            }

            match messages::receive(&self.inbox, self.release_deadline, self.poll_interval) {
                Inbound::Message(message) => self.handle(message)?,
                Inbound::TimedOut => self.expire(),
                Inbound::Closed => {
                    if let Some(deadline) = self.release_deadline {
                        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                        self.expire();
                    }
                    debug!("All sensors gone, fusion exiting");
                    break;
                }
            }
        }

        let stats = self.engine.stats();
        info!(
            "Fusion stopped: {} received, {} emitted ({} released by timeout), {} debounced, {} held, {} ghosts, {} protocol errors",
            stats.received,
            stats.emitted,
            stats.expired,
            stats.debounced,
            stats.held,
            stats.ghosts,
            stats.protocol_errors
        );
        Ok(())
    }
}
