//! Cooperative shutdown
//!
//! Every worker loop polls the stop flag. A fatal error recorded by any
//! worker also raises the flag; only the first one is kept.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::error::Error;

#[derive(Debug, Default)]
struct ShutdownState {
    stop_flag: AtomicBool,
    fatal: Mutex<Option<Error>>,
}

/// Process-wide stop flag shared by all pipeline threads
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<ShutdownState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker to stop
    pub fn request(&self) {
        if !self.state.stop_flag.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.state.stop_flag.load(Ordering::SeqCst)
    }

    /// Record a fatal error and stop the pipeline
    pub fn fail(&self, err: Error) {
        error!("Fatal: {}", err);
        let mut fatal = self.state.fatal.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if fatal.is_none() {
            *fatal = Some(err);
        }
        drop(fatal);
        self.request();
    }

    /// First fatal error recorded, if any
    pub fn take_fatal(&self) -> Option<Error> {
        self.state
            .fatal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}
