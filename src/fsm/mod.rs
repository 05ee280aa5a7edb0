//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────────┬───────────┬──────────┬───────────────┐  │
//! │  │ StateId         │ on_enter  │ on_exit  │ on_update     │  │
//! │  ├─────────────────┼───────────┼──────────┼───────────────┤  │
//! │  │ Init            │ fn(ctx)   │ -        │ fn(ctx)->Opt  │  │
//! │  │ FillWait        │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  │ DrainWaitLevel2 │ fn(ctx)   │ -        │ fn(ctx)->Opt  │  │
//! │  │ ...             │           │          │               │  │
//! │  │ DrainWaitLevel6 │ -         │ fn(ctx)  │ fn(ctx)->Opt  │  │
//! │  └─────────────────┴───────────┴──────────┴───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine decodes the raw state register and calls
//! `on_update` for that state.  If it returns `Some(next_id)`, the engine
//! runs `on_exit` for the current state, then `on_enter` for the next.
//!
//! A register value that does not decode to a [`StateId`] is fatal: both
//! pumps are commanded off and the engine latches a [`FaultKind`].  Every
//! later tick returns the same halt without running any handler.

pub mod context;
pub mod states;

use core::fmt;

use context::{FsmContext, PumpCommands};
use log::{error, info};

use crate::error::FaultKind;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state of the transfer machine.  The discriminant is the table
/// index and the value held in the raw state register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Init = 0,
    FillWait = 1,
    DrainWaitLevel2 = 2,
    DrainWaitLevel3 = 3,
    DrainWaitLevel4 = 4,
    DrainWaitLevel5 = 5,
    DrainWaitLevel6 = 6,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 7;

    /// Decode a raw register value.  `None` for anything out of range.
    pub fn from_repr(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Init),
            1 => Some(Self::FillWait),
            2 => Some(Self::DrainWaitLevel2),
            3 => Some(Self::DrainWaitLevel3),
            4 => Some(Self::DrainWaitLevel4),
            5 => Some(Self::DrainWaitLevel5),
            6 => Some(Self::DrainWaitLevel6),
            _ => None,
        }
    }

    /// Human-readable label, used in every log line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::FillWait => "FillWait",
            Self::DrainWaitLevel2 => "DrainWaitLevel2",
            Self::DrainWaitLevel3 => "DrainWaitLevel3",
            Self::DrainWaitLevel4 => "DrainWaitLevel4",
            Self::DrainWaitLevel5 => "DrainWaitLevel5",
            Self::DrainWaitLevel6 => "DrainWaitLevel6",
        }
    }

    /// True for the states in which the left pump drains the ladder side.
    pub fn is_draining(self) -> bool {
        matches!(
            self,
            Self::DrainWaitLevel2
                | Self::DrainWaitLevel3
                | Self::DrainWaitLevel4
                | Self::DrainWaitLevel5
                | Self::DrainWaitLevel6
        )
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// Outcome of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stayed(StateId),
    Transitioned { from: StateId, to: StateId },
    Halted(FaultKind),
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Raw state register.
    current: u8,
    tick_count: u64,
    state_entry_tick: u64,
    /// Latched once; never cleared.
    fault: Option<FaultKind>,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as u8,
            tick_count: 0,
            state_entry_tick: 0,
            fault: None,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        if let Some(state) = StateId::from_repr(self.current) {
            info!("FSM starting in state: {}", state);
            if let Some(enter) = self.table[state as usize].on_enter {
                enter(ctx);
            }
        }
    }

    /// Advance the FSM by one tick.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> Step {
        if let Some(fault) = self.fault {
            return Step::Halted(fault);
        }

        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let Some(state) = StateId::from_repr(self.current) else {
            return self.halt(FaultKind::UnknownState(self.current), ctx);
        };

        match (self.table[state as usize].on_update)(ctx) {
            Some(next) if next != state => {
                self.transition(state, next, ctx);
                Step::Transitioned {
                    from: state,
                    to: next,
                }
            }
            _ => Step::Stayed(state),
        }
    }

    /// Latch `fault`, force both pumps off.  Idempotent: the first fault
    /// wins.
    pub fn halt(&mut self, fault: FaultKind, ctx: &mut FsmContext) -> Step {
        if let Some(first) = self.fault {
            return Step::Halted(first);
        }
        error!("FSM halted: {}", fault);
        ctx.commands = PumpCommands::all_off();
        self.fault = Some(fault);
        Step::Halted(fault)
    }

    /// The current state, `None` when the register holds garbage.
    pub fn current_state(&self) -> Option<StateId> {
        StateId::from_repr(self.current)
    }

    /// Overwrite the raw state register without running any hooks.
    /// Diagnostics use this to exercise the unknown-state path.
    pub fn set_raw_state(&mut self, raw: u8) {
        self.current = raw;
    }

    /// The latched halt reason, if any.
    pub fn fault(&self) -> Option<FaultKind> {
        self.fault
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, from: StateId, to: StateId, ctx: &mut FsmContext) {
        info!("FSM transition: {} -> {}", from, to);

        if let Some(exit) = self.table[from as usize].on_exit {
            exit(ctx);
        }

        self.current = to as u8;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[to as usize].on_enter {
            enter(ctx);
        }
    }
}
