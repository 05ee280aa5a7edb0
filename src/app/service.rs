//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the transfer FSM, the calibration, the stall
//! monitor, and the shared context.  It exposes a clean, hardware-agnostic
//! API.  All I/O flows through port traits injected at call sites, making
//! the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//! ActuatorPort ◀──│  Calibration · FSM · Stall   │
//!                 └──────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::calibration::{Baseline, Calibration};
use crate::config::SystemConfig;
use crate::error::FaultKind;
use crate::fsm::context::{FsmContext, PumpCommands, PumpSide};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Step};
use crate::safety::StallMonitor;

use super::events::{AppEvent, CycleReport};
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    calibration: Calibration,
    stall: StallMonitor,
    /// What the pumps were last told.  Only differences are written.
    applied: PumpCommands,
    cycle_count: u64,
}

impl AppService {
    /// Construct the service around a captured baseline.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    /// The pumps are assumed off, as the setup phase leaves them.
    pub fn new(config: SystemConfig, baseline: Baseline) -> Self {
        let stall = StallMonitor::new(&config);
        if stall.is_armed() {
            info!(
                "Stall monitor armed (level={:?} ms, fill={:?} ms)",
                config.level_timeout_ms, config.fill_timeout_ms
            );
        }
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Init);

        Self {
            fsm,
            ctx,
            calibration: Calibration::new(baseline),
            stall,
            applied: PumpCommands::all_off(),
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Init).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(StateId::Init));
        info!("AppService started in {}", StateId::Init);
    }

    /// Cycle forever.  Returns only once the machine has halted; the pumps
    /// are off by then and the caller has nothing left to do but idle.
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> FaultKind {
        loop {
            if let Step::Halted(fault) = self.tick(hw, delay, sink) {
                return fault;
            }
            delay.delay_ms(self.ctx.config.loop_delay_ms);
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle: read sensors → FSM → stall check → actuators.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    ///
    /// Does not sleep the inter-cycle delay; [`run`](Self::run) does.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Step {
        if let Some(fault) = self.fsm.fault() {
            return Step::Halted(fault);
        }
        self.cycle_count += 1;

        // 1. Sensors, baseline-adjusted.
        self.ctx.sensors = self.calibration.snapshot(hw);
        sink.emit(&AppEvent::Cycle(CycleReport {
            cycle: self.cycle_count,
            state: self.fsm.current_state(),
            level_diffs: self.ctx.sensors.level_diffs(&self.ctx.config.level_channels),
            float: self.ctx.sensors.float,
        }));

        // 2. Exactly one FSM step.
        let mut step = self.fsm.tick(&mut self.ctx);

        // 3. Stall check on states that did not move this cycle.
        if let Step::Stayed(state) = step {
            if let Some(fault) = self.stall.evaluate(state, self.ctx.ms_in_state()) {
                step = self.fsm.halt(fault, &mut self.ctx);
            }
        }

        // 4. Actuators.
        match step {
            Step::Halted(fault) => {
                hw.all_off();
                self.applied = PumpCommands::all_off();
                sink.emit(&AppEvent::Halted(fault));
            }
            Step::Transitioned { from, to } => {
                self.apply_actuators(hw, delay, sink);
                sink.emit(&AppEvent::StateChanged { from, to });
            }
            Step::Stayed(_) => self.apply_actuators(hw, delay, sink),
        }

        step
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.  `None` if the state register is corrupt.
    pub fn state(&self) -> Option<StateId> {
        self.fsm.current_state()
    }

    /// Why the machine halted, if it has.
    pub fn fault(&self) -> Option<FaultKind> {
        self.fsm.fault()
    }

    pub fn is_halted(&self) -> bool {
        self.fsm.is_halted()
    }

    pub fn baseline(&self) -> &Baseline {
        self.calibration.baseline()
    }

    /// Control cycles executed since start (halted ticks not counted).
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Pump outputs as last written to the hardware.
    pub fn applied_commands(&self) -> PumpCommands {
        self.applied
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    /// Overwrite the raw state register.  Diagnostic hook for exercising
    /// the unknown-state halt on real hardware.
    pub fn set_raw_state(&mut self, raw: u8) {
        self.fsm.set_raw_state(raw);
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM pump commands into port calls.
    ///
    /// Stops go out first, then the armed settle pause, then starts, so
    /// the two pumps are never on together.  `applied` only follows
    /// writes that succeeded, so a failed write differs again next cycle
    /// and is retried.  While any stop is outstanding nothing is started
    /// and the settle pause stays armed.
    fn apply_actuators(
        &mut self,
        hw: &mut impl ActuatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        let want = self.ctx.commands;
        debug_assert!(!(want.left && want.right), "both pumps commanded on");

        let mut stop_pending = false;
        for side in [PumpSide::Left, PumpSide::Right] {
            if !want.is_on(side) && self.applied.is_on(side) {
                match hw.set_pump(side, false) {
                    Ok(()) => self.applied.set(side, false),
                    Err(e) => {
                        warn!("{:?} pump stop failed: {}, holding starts", side, e);
                        sink.emit(&AppEvent::PumpWriteFailed { side, on: false });
                        stop_pending = true;
                    }
                }
            }
        }
        if stop_pending {
            return;
        }

        if want.settle_before_start_ms > 0 {
            delay.delay_ms(want.settle_before_start_ms);
            self.ctx.commands.settle_before_start_ms = 0;
        }

        for side in [PumpSide::Left, PumpSide::Right] {
            if want.is_on(side) && !self.applied.is_on(side) {
                match hw.set_pump(side, true) {
                    Ok(()) => self.applied.set(side, true),
                    Err(e) => {
                        warn!("{:?} pump start failed: {}", side, e);
                        sink.emit(&AppEvent::PumpWriteFailed { side, on: true });
                    }
                }
            }
        }
    }
}
