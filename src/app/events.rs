//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the bring-up
//! sequence emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them.

use crate::error::FaultKind;
use crate::fsm::StateId;
use crate::fsm::context::{FloatState, PumpSide};
use crate::sensors::mpr121::CHANNEL_COUNT;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(StateId),

    /// Per-cycle diagnostic dump, emitted before the machine is stepped.
    Cycle(CycleReport),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// Baseline frozen at the end of setup.
    BaselineCaptured([u16; CHANNEL_COUNT]),

    /// Pump outputs changed while the operator was pre-positioning.
    ManualControl { left: bool, right: bool },

    /// Both manual jog buttons held at once; neither pump runs.
    ManualConflict,

    /// A pump output write failed and will be retried.  While a stop is
    /// outstanding no pump is started.
    PumpWriteFailed { side: PumpSide, on: bool },

    /// The machine stopped for good; pumps are off.
    Halted(FaultKind),
}

/// What the operator sees on the console once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// State the cycle runs in.  `None` if the register is corrupt.
    pub state: Option<StateId>,
    /// Baseline-adjusted diffs for ladder levels 1..=6.
    pub level_diffs: [i32; 6],
    pub float: FloatState,
}
