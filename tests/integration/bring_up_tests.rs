//! Integration tests for the setup phase: warm-up, manual
//! pre-positioning, and baseline capture.

use crate::mock_hw::{ActuatorCall, MockDelay, MockHardware, RecordingSink, REST_COUNT};

use aquaauto::app::events::AppEvent;
use aquaauto::app::ports::ButtonSnapshot;
use aquaauto::app::setup::{bring_up, run_pre_positioning};
use aquaauto::config::{BaselineSource, SystemConfig};
use aquaauto::error::{ConfigError, Error, SensorError};
use aquaauto::fsm::context::PumpSide;
use aquaauto::fsm::StateId;
use aquaauto::sensors::mpr121::CHANNEL_COUNT;

const LEFT: ButtonSnapshot = ButtonSnapshot {
    left: true,
    right: false,
    start: false,
};
const RIGHT: ButtonSnapshot = ButtonSnapshot {
    left: false,
    right: true,
    start: false,
};
const BOTH: ButtonSnapshot = ButtonSnapshot {
    left: true,
    right: true,
    start: false,
};
const IDLE: ButtonSnapshot = ButtonSnapshot {
    left: false,
    right: false,
    start: false,
};

#[test]
fn pumps_follow_buttons_with_interlock() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = RecordingSink::new();
    hw.press_sequence([LEFT, LEFT, BOTH, BOTH, RIGHT, IDLE]);

    run_pre_positioning(&mut hw, &mut delay, &config, &mut sink);

    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::SetPump { side: PumpSide::Left, on: true },
            ActuatorCall::SetPump { side: PumpSide::Left, on: false },
            ActuatorCall::SetPump { side: PumpSide::Right, on: true },
            ActuatorCall::SetPump { side: PumpSide::Right, on: false },
            ActuatorCall::AllOff,
        ]
    );
    assert!(!hw.ever_both_on());
    assert_eq!(hw.button_polls, 7);
    assert_eq!(delay.sleeps_ms, vec![config.manual_poll_ms; 6]);

    let conflicts = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ManualConflict))
        .count();
    assert_eq!(conflicts, 1, "one warning per two-button press");
}

#[test]
fn direct_hand_over_stops_before_starting() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    hw.press_sequence([LEFT, RIGHT]);

    run_pre_positioning(&mut hw, &mut MockDelay::new(), &config, &mut sink);

    assert_eq!(
        &hw.calls[..3],
        &[
            ActuatorCall::SetPump { side: PumpSide::Left, on: true },
            ActuatorCall::SetPump { side: PumpSide::Left, on: false },
            ActuatorCall::SetPump { side: PumpSide::Right, on: true },
        ]
    );
}

#[test]
fn start_while_jogging_leaves_pumps_off() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    hw.press_sequence([
        RIGHT,
        ButtonSnapshot {
            start: true,
            ..RIGHT
        },
    ]);

    run_pre_positioning(&mut hw, &mut MockDelay::new(), &config, &mut sink);

    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert!(!hw.pump_on(PumpSide::Right));
}

#[test]
fn bring_up_sequence_and_timing() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = RecordingSink::new();
    hw.press_sequence([RIGHT, RIGHT]);

    let app = bring_up(&mut hw, &mut delay, config.clone(), &mut sink).unwrap();

    assert_eq!(
        delay.sleeps_ms,
        vec![
            config.sensor_warmup_ms,
            config.manual_poll_ms,
            config.manual_poll_ms,
            config.pre_position_settle_ms,
        ]
    );
    assert_eq!(hw.calls.first(), Some(&ActuatorCall::AllOff));
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(hw.channel_reads, CHANNEL_COUNT);
    assert_eq!(hw.chip_baseline_reads, 0);
    assert_eq!(app.baseline().values(), &[REST_COUNT; CHANNEL_COUNT]);
    assert_eq!(app.cycle_count(), 0);
    assert!(
        sink.events
            .contains(&AppEvent::BaselineCaptured([REST_COUNT; CHANNEL_COUNT]))
    );
}

#[test]
fn chip_baseline_source_reads_baseline_registers() {
    let config = SystemConfig {
        baseline_source: BaselineSource::ChipBaseline,
        ..SystemConfig::default()
    };
    let mut hw = MockHardware::new();
    hw.chip_baseline = [700; CHANNEL_COUNT];

    let app = bring_up(
        &mut hw,
        &mut MockDelay::new(),
        config,
        &mut RecordingSink::new(),
    )
    .unwrap();

    assert_eq!(hw.chip_baseline_reads, CHANNEL_COUNT);
    assert_eq!(app.baseline().value(6), Some(700));
}

#[test]
fn capture_failure_aborts_bring_up() {
    let mut hw = MockHardware::new();
    hw.sensors_failing = true;

    let result = bring_up(
        &mut hw,
        &mut MockDelay::new(),
        SystemConfig::default(),
        &mut RecordingSink::new(),
    );
    assert!(matches!(result, Err(Error::Sensor(SensorError::Bus))));
}

#[test]
fn invalid_config_is_rejected_before_touching_pumps() {
    let config = SystemConfig {
        dry_threshold: 0,
        ..SystemConfig::default()
    };
    let mut hw = MockHardware::new();

    let result = bring_up(
        &mut hw,
        &mut MockDelay::new(),
        config,
        &mut RecordingSink::new(),
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::Invalid(_)))));
    assert!(hw.calls.is_empty());
    assert_eq!(hw.button_polls, 0);
}

#[test]
fn baseline_is_frozen_for_the_whole_run() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut delay = MockDelay::new();
    let mut sink = RecordingSink::new();

    let mut app = bring_up(&mut hw, &mut delay, config.clone(), &mut sink).unwrap();
    let frozen = *app.baseline();
    app.start(&mut sink);

    // Liquid moves, counts drift; the reference must not.
    for step in 0..50 {
        hw.set_all_levels(&config, -(step % 30));
        app.tick(&mut hw, &mut delay, &mut sink);
    }

    assert_eq!(*app.baseline(), frozen);
    assert_eq!(hw.chip_baseline_reads, 0);
    assert_eq!(hw.channel_reads, CHANNEL_COUNT * 51);
    let captures = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::BaselineCaptured(_)))
        .count();
    assert_eq!(captures, 1);
    assert_ne!(app.state(), Some(StateId::Init));
}

#[test]
fn jog_hand_over_waits_for_a_stop_that_lands() {
    let config = SystemConfig::default();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    hw.press_sequence([LEFT, RIGHT, RIGHT, RIGHT]);
    hw.fail_writes(PumpSide::Left, false, 2);

    run_pre_positioning(&mut hw, &mut MockDelay::new(), &config, &mut sink);

    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::SetPump { side: PumpSide::Left, on: true },
            ActuatorCall::SetPump { side: PumpSide::Left, on: false },
            ActuatorCall::SetPump { side: PumpSide::Right, on: true },
            ActuatorCall::AllOff,
        ]
    );
    assert!(!hw.ever_both_on());
    assert_eq!(hw.failed_writes, 2);
}
