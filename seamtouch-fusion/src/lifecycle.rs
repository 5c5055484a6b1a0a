//! Touch lifecycle arbitration
//!
//! Every fused touch passes through a small state machine that holds the
//! first `Down` back until it is confirmed and holds each `Up` back until
//! either a second `Up` confirms it or the release timeout fires.

use seamtouch_common::TouchEvent;
use tracing::debug;

use crate::filters::{self, Verdict};
use crate::history::HistoryBuffer;

/// Arbitrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    DownPending,
    Down,
    Move,
    UpPending,
    Up,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::DownPending => write!(f, "down-pending"),
            LifecycleState::Down => write!(f, "down"),
            LifecycleState::Move => write!(f, "move"),
            LifecycleState::UpPending => write!(f, "up-pending"),
            LifecycleState::Up => write!(f, "up"),
        }
    }
}

/// Sensor event reduced to the three kinds the arbitrator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduced {
    Down,
    Move,
    Up,
}

impl Reduced {
    fn from_event(event: TouchEvent) -> Option<Self> {
        match event {
            TouchEvent::Down => Some(Reduced::Down),
            TouchEvent::Move => Some(Reduced::Move),
            TouchEvent::Up => Some(Reduced::Up),
            _ => None,
        }
    }
}

/// Result of arbitrating one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// The newest history entry now carries this kind and should be emitted
    Emit(TouchEvent),
    /// Held back; nothing to emit
    Suppressed,
    /// Unexpected input; state has been reset and the sample discarded
    ProtocolError,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
    /// Set whenever a transition enters `UpPending`; taken by the caller
    arm_release: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// True once after each entry into `UpPending`
    pub fn take_release_request(&mut self) -> bool {
        std::mem::take(&mut self.arm_release)
    }

    fn enter_up_pending(&mut self) -> Arbitration {
        self.state = LifecycleState::UpPending;
        self.arm_release = true;
        Arbitration::Suppressed
    }

    fn protocol_error(&mut self, event: TouchEvent) -> Arbitration {
        debug!("Touch protocol error: {} while {}", event, self.state);
        self.state = LifecycleState::Idle;
        Arbitration::ProtocolError
    }

    /// Advance the state machine with the newest history entry
    ///
    /// On `Emit` the newest entry's kind has already been rewritten. After
    /// an emitted `Up` the state returns to `Idle`.
    pub fn arbitrate(&mut self, history: &mut HistoryBuffer, debounce_interval_ms: u64) -> Arbitration {
        let Some(event) = history.latest().map(|s| s.event) else {
            return Arbitration::Suppressed;
        };

        let Some(reduced) = Reduced::from_event(event) else {
            return self.protocol_error(event);
        };

        let next = match (self.state, reduced) {
            (LifecycleState::Idle, Reduced::Down | Reduced::Move) => {
                self.state = LifecycleState::DownPending;
                return Arbitration::Suppressed;
            }
            (LifecycleState::Idle, Reduced::Up) => return self.protocol_error(event),

            (LifecycleState::DownPending, Reduced::Down | Reduced::Move) => LifecycleState::Down,
            (LifecycleState::DownPending, Reduced::Up) => return self.enter_up_pending(),

            (LifecycleState::Down | LifecycleState::Move, Reduced::Down | Reduced::Move) => LifecycleState::Move,
            (LifecycleState::Down | LifecycleState::Move, Reduced::Up) => return self.enter_up_pending(),

            (LifecycleState::UpPending, Reduced::Down | Reduced::Move) => LifecycleState::Move,
            (LifecycleState::UpPending, Reduced::Up) => LifecycleState::Up,

            // Emitting Up resets to Idle, so the state is never observed here
            (LifecycleState::Up, Reduced::Down | Reduced::Move) => {
                if filters::debounce(history, debounce_interval_ms) == Verdict::Pass {
                    return self.enter_up_pending();
                }
                return Arbitration::Suppressed;
            }
            (LifecycleState::Up, Reduced::Up) => LifecycleState::Up,
        };

        let emitted = match next {
            LifecycleState::Down => TouchEvent::Down,
            LifecycleState::Move => TouchEvent::Move,
            _ => TouchEvent::Up,
        };

        if let Some(latest) = history.latest_mut() {
            latest.event = emitted;
        }

        debug!("Lifecycle {} -> {} ({})", self.state, next, event);

        self.state = if next == LifecycleState::Up {
            LifecycleState::Idle
        } else {
            next
        };

        Arbitration::Emit(emitted)
    }

    /// Confirm a pending release after the timeout
    ///
    /// Rewrites the newest history entry to `Up`, returns to `Idle` and
    /// reports whether a release should be emitted.
    pub fn expire(&mut self, history: &mut HistoryBuffer) -> bool {
        if self.state != LifecycleState::UpPending {
            return false;
        }
        let Some(latest) = history.latest_mut() else {
            return false;
        };

        latest.event = TouchEvent::Up;
        self.state = LifecycleState::Idle;
        self.arm_release = false;
        true
    }
}
