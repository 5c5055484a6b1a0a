//! Queue message types and the send/receive helpers around them
//!
//! All queues are bounded. Producers never block: a full queue drops the
//! message and logs a warning.

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use seamtouch_common::{SensorGeometry, SensorPosition, TouchSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Traffic into the fusion thread
#[derive(Debug, Clone)]
pub enum FusionMessage {
    /// A sensor finished its handshake
    SensorReady(Arc<SensorGeometry>),
    /// Raw sensor-local touch, already timestamped
    Touch(TouchSample),
}

/// Outcome of one fusion receive
#[derive(Debug)]
pub enum Inbound {
    Message(FusionMessage),
    /// Nothing arrived before the deadline or poll interval
    TimedOut,
    /// Every producer has exited and the queue is empty
    Closed,
}

/// Low-priority status and configuration traffic
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Free-form status line from a sensor
    Status { position: SensorPosition, text: String },
    /// Every expected position is registered
    ConfigurationComplete(Vec<Arc<SensorGeometry>>),
}

/// Receive with a release deadline when one is armed, else the poll interval
pub fn receive(rx: &Receiver<FusionMessage>, deadline: Option<Instant>, poll_interval: Duration) -> Inbound {
    let result = match deadline {
        Some(deadline) => rx.recv_deadline(deadline),
        None => rx.recv_timeout(poll_interval),
    };

    match result {
        Ok(message) => Inbound::Message(message),
        Err(RecvTimeoutError::Timeout) => Inbound::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Inbound::Closed,
    }
}

/// Non-blocking send
///
/// Returns false if the message was dropped because the queue is full or
/// the receiver is gone.
pub fn offer<T>(tx: &Sender<T>, message: T, queue: &str) -> bool {
    match tx.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("{} queue full, dropping message", queue);
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}
