//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  INIT ──[startup delay]──▶ FILL_WAIT ──[float tripped]──▶ DRAIN_L2
//!                               ▲                              │ [L2 < thr]
//!                               │                              ▼
//!                               │                           DRAIN_L3 ─▶ L4 ─▶ L5
//!                               │                                              │
//!                               └──────────[L6 < thr]────── DRAIN_L6 ◀─────────┘
//! ```
//!
//! The drain side never waits on level 1: the left pump intake must stay
//! submerged.

use log::info;

use super::context::{FsmContext, WaterLevel};
use super::{StateDescriptor, StateId};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Init
        StateDescriptor {
            id: StateId::Init,
            on_enter: Some(init_enter),
            on_exit: None,
            on_update: init_update,
        },
        // Index 1: FillWait
        StateDescriptor {
            id: StateId::FillWait,
            on_enter: Some(fill_enter),
            on_exit: Some(fill_exit),
            on_update: fill_update,
        },
        // Index 2: DrainWaitLevel2 (first drain rung: starts the left pump)
        StateDescriptor {
            id: StateId::DrainWaitLevel2,
            on_enter: Some(drain_enter),
            on_exit: None,
            on_update: drain_l2_update,
        },
        // Index 3
        StateDescriptor {
            id: StateId::DrainWaitLevel3,
            on_enter: None,
            on_exit: None,
            on_update: drain_l3_update,
        },
        // Index 4
        StateDescriptor {
            id: StateId::DrainWaitLevel4,
            on_enter: None,
            on_exit: None,
            on_update: drain_l4_update,
        },
        // Index 5
        StateDescriptor {
            id: StateId::DrainWaitLevel5,
            on_enter: None,
            on_exit: None,
            on_update: drain_l5_update,
        },
        // Index 6: DrainWaitLevel6 (last rung: stops the left pump)
        StateDescriptor {
            id: StateId::DrainWaitLevel6,
            on_enter: None,
            on_exit: Some(drain_exit),
            on_update: drain_l6_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT
// ═══════════════════════════════════════════════════════════════════════════

fn init_enter(ctx: &mut FsmContext) {
    ctx.commands.left = false;
    ctx.commands.right = false;
    info!(
        "INIT: L->R water movement commencing in {} ms",
        ctx.config.startup_delay_ms
    );
}

fn init_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.commands.settle_before_start_ms = ctx.config.startup_delay_ms;
    Some(StateId::FillWait)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FILL_WAIT: right pump moving water toward the float chamber
// ═══════════════════════════════════════════════════════════════════════════

fn fill_enter(ctx: &mut FsmContext) {
    ctx.commands.left = false;
    ctx.commands.right = true;
    info!("FILL: right pump on, waiting for float");
}

fn fill_exit(ctx: &mut FsmContext) {
    ctx.commands.right = false;
    ctx.commands.settle_before_start_ms = ctx.config.settle_delay_ms;
}

fn fill_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.sensors.float == super::context::FloatState::Tripped {
        info!("FILL: float tripped");
        return Some(StateId::DrainWaitLevel2);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DRAIN_WAIT_Ln: left pump running, walking the ladder bottom-up
// ═══════════════════════════════════════════════════════════════════════════

fn drain_enter(ctx: &mut FsmContext) {
    ctx.commands.right = false;
    ctx.commands.left = true;
    info!("DRAIN: left pump on");
}

fn drain_exit(ctx: &mut FsmContext) {
    ctx.commands.left = false;
    ctx.commands.settle_before_start_ms = ctx.config.settle_delay_ms;
}

/// Shared rung check: advance only when *this* level has crossed.
fn drain_step(ctx: &FsmContext, level: WaterLevel, next: StateId) -> Option<StateId> {
    if ctx.level_crossed(level) {
        info!(
            "DRAIN: level {} crossed (diff {})",
            level.rank(),
            ctx.sensors.level_diff(level, &ctx.config.level_channels)
        );
        return Some(next);
    }
    None
}

fn drain_l2_update(ctx: &mut FsmContext) -> Option<StateId> {
    drain_step(ctx, WaterLevel::L2, StateId::DrainWaitLevel3)
}

fn drain_l3_update(ctx: &mut FsmContext) -> Option<StateId> {
    drain_step(ctx, WaterLevel::L3, StateId::DrainWaitLevel4)
}

fn drain_l4_update(ctx: &mut FsmContext) -> Option<StateId> {
    drain_step(ctx, WaterLevel::L4, StateId::DrainWaitLevel5)
}

fn drain_l5_update(ctx: &mut FsmContext) -> Option<StateId> {
    drain_step(ctx, WaterLevel::L5, StateId::DrainWaitLevel6)
}

fn drain_l6_update(ctx: &mut FsmContext) -> Option<StateId> {
    drain_step(ctx, WaterLevel::L6, StateId::FillWait)
}
