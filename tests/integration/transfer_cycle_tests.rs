//! Integration tests for the AppService → FSM → actuators pipeline.
//!
//! These run on the host and drive the transfer loop against scripted
//! sensor values, checking the state sequence, the pump call log and the
//! halt behaviour.

use crate::mock_hw::{ActuatorCall, MockDelay, MockHardware, RecordingSink, REST_COUNT};

use aquaauto::app::events::AppEvent;
use aquaauto::app::service::AppService;
use aquaauto::calibration::Baseline;
use aquaauto::config::SystemConfig;
use aquaauto::error::FaultKind;
use aquaauto::fsm::context::{FloatState, PumpSide, WaterLevel};
use aquaauto::fsm::{StateId, Step};
use aquaauto::sensors::mpr121::CHANNEL_COUNT;

/// Comfortably above the default threshold of 20.
const WET: i32 = 100;

struct Rig {
    app: AppService,
    hw: MockHardware,
    delay: MockDelay,
    sink: RecordingSink,
    config: SystemConfig,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let mut app = AppService::new(
            config.clone(),
            Baseline::from_values([REST_COUNT; CHANNEL_COUNT]),
        );
        let mut hw = MockHardware::new();
        hw.set_all_levels(&config, WET);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            hw,
            delay: MockDelay::new(),
            sink,
            config,
        }
    }

    fn tick(&mut self) -> Step {
        self.app.tick(&mut self.hw, &mut self.delay, &mut self.sink)
    }

    fn level(&mut self, level: WaterLevel, diff: i32) {
        self.hw.set_level_diff(&self.config, level, diff);
    }

    /// Init → FillWait → DrainWaitLevel2, float reset to dry afterwards.
    fn into_drain(&mut self) {
        self.tick();
        self.hw.float = FloatState::Tripped;
        assert_eq!(
            self.tick(),
            Step::Transitioned {
                from: StateId::FillWait,
                to: StateId::DrainWaitLevel2
            }
        );
        self.hw.float = FloatState::Dry;
    }
}

fn rig() -> Rig {
    Rig::new(SystemConfig::default())
}

// ── Full cycle ────────────────────────────────────────────────

#[test]
fn full_cycle_visits_every_rung_in_order() {
    let mut r = rig();
    r.into_drain();

    for level in [
        WaterLevel::L2,
        WaterLevel::L3,
        WaterLevel::L4,
        WaterLevel::L5,
        WaterLevel::L6,
    ] {
        r.level(level, 0);
        r.tick();
    }

    assert_eq!(r.app.state(), Some(StateId::FillWait));
    assert_eq!(
        r.sink.transitions(),
        vec![
            (StateId::Init, StateId::FillWait),
            (StateId::FillWait, StateId::DrainWaitLevel2),
            (StateId::DrainWaitLevel2, StateId::DrainWaitLevel3),
            (StateId::DrainWaitLevel3, StateId::DrainWaitLevel4),
            (StateId::DrainWaitLevel4, StateId::DrainWaitLevel5),
            (StateId::DrainWaitLevel5, StateId::DrainWaitLevel6),
            (StateId::DrainWaitLevel6, StateId::FillWait),
        ]
    );
    assert_eq!(
        r.hw.calls,
        vec![
            ActuatorCall::SetPump { side: PumpSide::Right, on: true },
            ActuatorCall::SetPump { side: PumpSide::Right, on: false },
            ActuatorCall::SetPump { side: PumpSide::Left, on: true },
            ActuatorCall::SetPump { side: PumpSide::Left, on: false },
            ActuatorCall::SetPump { side: PumpSide::Right, on: true },
        ]
    );
    assert!(!r.hw.ever_both_on());
    // Startup delay, then one settle per pump swap.
    assert_eq!(r.delay.sleeps_ms, vec![2000, 2000, 2000]);
}

#[test]
fn repeated_cycles_never_overlap_pumps() {
    let mut r = rig();
    r.tick();
    for _ in 0..5 {
        r.hw.float = FloatState::Tripped;
        r.tick();
        r.hw.float = FloatState::Dry;
        r.hw.set_all_levels(&r.config, 0);
        for _ in 0..5 {
            r.tick();
        }
        r.hw.set_all_levels(&r.config, WET);
        assert_eq!(r.app.state(), Some(StateId::FillWait));
    }
    assert!(!r.hw.ever_both_on());
    assert_eq!(r.sink.transitions().len(), 1 + 5 * 6);
}

// ── Threshold behaviour ───────────────────────────────────────

#[test]
fn thousand_reads_at_threshold_never_advance() {
    let mut r = rig();
    r.into_drain();
    r.level(WaterLevel::L2, r.config.dry_threshold);

    for _ in 0..1000 {
        assert_eq!(r.tick(), Step::Stayed(StateId::DrainWaitLevel2));
    }
    assert!(r.hw.pump_on(PumpSide::Left));
    assert!(!r.hw.pump_on(PumpSide::Right));
}

#[test]
fn level_advances_on_first_read_below_threshold() {
    let mut r = rig();
    r.into_drain();

    for (diff, expected) in [
        (25, Step::Stayed(StateId::DrainWaitLevel2)),
        (25, Step::Stayed(StateId::DrainWaitLevel2)),
        (
            19,
            Step::Transitioned {
                from: StateId::DrainWaitLevel2,
                to: StateId::DrainWaitLevel3,
            },
        ),
    ] {
        r.level(WaterLevel::L2, diff);
        assert_eq!(r.tick(), expected);
    }
}

#[test]
fn upper_rungs_crossing_early_do_not_skip() {
    let mut r = rig();
    r.into_drain();
    for level in [WaterLevel::L3, WaterLevel::L4, WaterLevel::L5, WaterLevel::L6] {
        r.level(level, -50);
    }

    assert_eq!(r.tick(), Step::Stayed(StateId::DrainWaitLevel2));

    r.level(WaterLevel::L2, -50);
    for expected in [
        StateId::DrainWaitLevel3,
        StateId::DrainWaitLevel4,
        StateId::DrainWaitLevel5,
        StateId::DrainWaitLevel6,
        StateId::FillWait,
    ] {
        r.tick();
        assert_eq!(r.app.state(), Some(expected));
    }
}

#[test]
fn level_one_is_never_consulted() {
    let mut r = rig();
    r.into_drain();
    r.level(WaterLevel::L1, -500);

    for _ in 0..50 {
        assert_eq!(r.tick(), Step::Stayed(StateId::DrainWaitLevel2));
    }
}

#[test]
fn cycle_report_carries_baseline_adjusted_diffs() {
    let mut r = rig();
    r.level(WaterLevel::L3, -7);
    r.level(WaterLevel::L6, 42);
    r.tick();

    let report = r
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Cycle(c) => Some(*c),
            _ => None,
        })
        .unwrap();
    assert_eq!(report.cycle, 1);
    assert_eq!(report.state, Some(StateId::Init));
    assert_eq!(report.level_diffs, [WET, WET, -7, WET, WET, 42]);
}

// ── Sensor faults are not machine faults ─────────────────────

#[test]
fn failed_reads_reuse_last_good_values() {
    let mut r = rig();
    r.into_drain();
    r.tick();

    r.hw.sensors_failing = true;
    for _ in 0..20 {
        assert_eq!(r.tick(), Step::Stayed(StateId::DrainWaitLevel2));
    }
    assert!(!r.app.is_halted());
}

// ── Actuator write failures ──────────────────────────────────

#[test]
fn failed_stop_on_swap_is_retried_before_any_start() {
    let mut r = rig();
    r.tick();
    r.hw.fail_writes(PumpSide::Right, false, 3);

    r.hw.float = FloatState::Tripped;
    r.tick();
    r.hw.float = FloatState::Dry;
    r.tick();
    r.tick();
    assert_eq!(r.app.state(), Some(StateId::DrainWaitLevel2));
    assert_eq!(r.hw.failed_writes, 3);
    assert!(r.hw.pump_on(PumpSide::Right));
    assert!(!r.hw.pump_on(PumpSide::Left));
    assert_eq!(r.delay.sleeps_ms, vec![2000], "settle waits for the stop");

    r.tick();
    assert!(!r.hw.pump_on(PumpSide::Right));
    assert!(r.hw.pump_on(PumpSide::Left));
    assert_eq!(r.delay.sleeps_ms, vec![2000, 2000]);
    assert!(!r.hw.ever_both_on());

    let failures = r
        .sink
        .events
        .iter()
        .filter(|e| {
            **e == AppEvent::PumpWriteFailed {
                side: PumpSide::Right,
                on: false,
            }
        })
        .count();
    assert_eq!(failures, 3);
}

#[test]
fn failed_start_leaves_pump_off_until_a_write_lands() {
    let mut r = rig();
    r.hw.fail_writes(PumpSide::Right, true, 2);
    r.tick();
    r.tick();
    assert!(!r.hw.pump_on(PumpSide::Right));
    assert!(!r.app.applied_commands().right);

    r.tick();
    assert!(r.hw.pump_on(PumpSide::Right));
    assert_eq!(r.app.state(), Some(StateId::FillWait));
}

#[test]
fn rung_advances_while_stop_is_outstanding() {
    let mut r = rig();
    r.tick();
    r.hw.fail_writes(PumpSide::Right, false, 1);
    r.hw.float = FloatState::Tripped;
    r.tick();
    r.hw.float = FloatState::Dry;

    r.level(WaterLevel::L2, 0);
    r.tick();
    assert_eq!(r.app.state(), Some(StateId::DrainWaitLevel3));
    assert!(!r.hw.pump_on(PumpSide::Right));
    assert!(r.hw.pump_on(PumpSide::Left));
    assert!(!r.hw.ever_both_on());
}

// ── Unknown state ─────────────────────────────────────────────

#[test]
fn unknown_state_stops_pumps_and_halts_for_good() {
    let mut r = rig();
    r.into_drain();
    assert!(r.hw.pump_on(PumpSide::Left));

    r.app.set_raw_state(42);
    let fault = FaultKind::UnknownState(42);
    assert_eq!(r.tick(), Step::Halted(fault));
    assert_eq!(r.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert!(!r.hw.pump_on(PumpSide::Left));
    assert!(!r.hw.pump_on(PumpSide::Right));

    let reads = r.hw.channel_reads;
    let calls = r.hw.calls.len();
    for _ in 0..100 {
        assert_eq!(r.tick(), Step::Halted(fault));
    }
    assert_eq!(r.hw.channel_reads, reads, "halted service must not poll sensors");
    assert_eq!(r.hw.calls.len(), calls);
    assert_eq!(r.sink.halts(), 1);
    assert_eq!(r.app.fault(), Some(fault));
}

#[test]
fn run_returns_on_unknown_state() {
    let mut r = rig();
    r.app.set_raw_state(200);
    let fault = r.app.run(&mut r.hw, &mut r.delay, &mut r.sink);
    assert_eq!(fault, FaultKind::UnknownState(200));
    assert!(r.delay.sleeps_ms.is_empty());
}

// ── Stall monitor ─────────────────────────────────────────────

#[test]
fn stalled_fill_halts_when_monitor_armed() {
    let config = SystemConfig {
        fill_timeout_ms: Some(60_000),
        level_timeout_ms: Some(15_000),
        ..SystemConfig::default()
    };
    let mut r = Rig::new(config);

    let fault = r.app.run(&mut r.hw, &mut r.delay, &mut r.sink);
    assert_eq!(
        fault,
        FaultKind::Stalled {
            state: StateId::FillWait,
            waited_ms: 60_500
        }
    );
    assert_eq!(r.hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert!(!r.hw.pump_on(PumpSide::Right));
    assert_eq!(r.sink.halts(), 1);
}

#[test]
fn stalled_rung_halts_with_its_own_limit() {
    let config = SystemConfig {
        level_timeout_ms: Some(15_000),
        ..SystemConfig::default()
    };
    let mut r = Rig::new(config);
    r.into_drain();

    let fault = r.app.run(&mut r.hw, &mut r.delay, &mut r.sink);
    assert!(matches!(
        fault,
        FaultKind::Stalled {
            state: StateId::DrainWaitLevel2,
            waited_ms
        } if waited_ms > 15_000
    ));
    assert!(!r.hw.pump_on(PumpSide::Left));
}

#[test]
fn stall_time_counts_cycles_not_settle_pauses() {
    let config = SystemConfig {
        level_timeout_ms: Some(15_000),
        ..SystemConfig::default()
    };
    let mut r = Rig::new(config);
    r.into_drain();
    assert_eq!(r.delay.sleeps_ms, vec![2000, 2000]);

    let fault = r.app.run(&mut r.hw, &mut r.delay, &mut r.sink);
    assert_eq!(
        fault,
        FaultKind::Stalled {
            state: StateId::DrainWaitLevel2,
            waited_ms: 15_500
        }
    );
    // 30 loop pauses plus the swap settle actually elapsed in the rung.
    let slept: u32 = r.delay.sleeps_ms[1..].iter().sum();
    assert_eq!(slept, 17_000);
}

#[test]
fn disarmed_monitor_waits_forever() {
    let mut r = rig();
    r.tick();
    for _ in 0..10_000 {
        assert_eq!(r.tick(), Step::Stayed(StateId::FillWait));
    }
    assert!(r.hw.pump_on(PumpSide::Right));
}
