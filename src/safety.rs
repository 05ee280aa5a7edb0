//! Stall monitor.
//!
//! Runs **every tick after the FSM** and checks how long the machine has
//! been waiting in its current state.  A chamber that never reaches its
//! threshold (stuck float, dead sensor board) would otherwise leave a pump
//! running forever.
//!
//! Both limits are optional and disabled by default:
//!
//! | Limit              | Applies to          |
//! |--------------------|---------------------|
//! | `level_timeout_ms` | each DrainWaitLevelN|
//! | `fill_timeout_ms`  | FillWait            |
//!
//! Exceeding one yields [`FaultKind::Stalled`]; the service treats it
//! exactly like any other halt.
//!
//! Time in state is nominal: ticks spent in the state times the
//! inter-cycle delay.  Settle and startup pauses, and the time the reads
//! themselves take, are not counted, so a state has really been running
//! somewhat longer than `waited_ms` when it trips.

use log::warn;

use crate::config::SystemConfig;
use crate::error::FaultKind;
use crate::fsm::StateId;

pub struct StallMonitor {
    level_timeout_ms: Option<u32>,
    fill_timeout_ms: Option<u32>,
}

impl StallMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            level_timeout_ms: config.level_timeout_ms,
            fill_timeout_ms: config.fill_timeout_ms,
        }
    }

    /// True when at least one limit is configured.
    pub fn is_armed(&self) -> bool {
        self.level_timeout_ms.is_some() || self.fill_timeout_ms.is_some()
    }

    /// Check `state` after `ms_in_state` milliseconds.
    pub fn evaluate(&self, state: StateId, ms_in_state: u64) -> Option<FaultKind> {
        let limit = match state {
            StateId::Init => None,
            StateId::FillWait => self.fill_timeout_ms,
            _ => self.level_timeout_ms,
        }?;

        if ms_in_state > u64::from(limit) {
            warn!(
                "STALL: {} exceeded {} ms (waited {} ms)",
                state, limit, ms_in_state
            );
            return Some(FaultKind::Stalled {
                state,
                waited_ms: ms_in_state,
            });
        }
        None
    }
}
