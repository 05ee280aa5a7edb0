//! Setup phase: warm-up, manual pre-positioning, baseline capture.
//!
//! Runs once, after the capacitive controller has been detected and before
//! the transfer loop exists.  The operator jogs the pumps with two buttons
//! until the water sits just above the top electrode on the right side,
//! then presses Start.  The settled liquid is what the baseline is taken
//! from, so both pumps are stopped and given time to calm before capture.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::calibration::Baseline;
use crate::config::SystemConfig;
use crate::error::Error;
use crate::fsm::context::{PumpCommands, PumpSide};

use super::events::AppEvent;
use super::ports::{ActuatorPort, ButtonSnapshot, EventSink, ManualControlPort, SensorPort};
use super::service::AppService;

/// Result of one button poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Keep polling; drive the pumps like this.
    Jog {
        left: bool,
        right: bool,
        /// Both jog buttons just went down together.
        conflict_began: bool,
    },
    /// Start pressed.
    Done,
}

/// Button-to-pump mapping with the two-button interlock.
#[derive(Debug, Default)]
pub struct PrePositioning {
    conflict: bool,
}

impl PrePositioning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&mut self, buttons: ButtonSnapshot) -> Poll {
        if buttons.start {
            return Poll::Done;
        }

        if buttons.left && buttons.right {
            let conflict_began = !self.conflict;
            self.conflict = true;
            return Poll::Jog {
                left: false,
                right: false,
                conflict_began,
            };
        }

        self.conflict = false;
        Poll::Jog {
            left: buttons.left,
            right: buttons.right,
            conflict_began: false,
        }
    }
}

/// Poll the jog buttons until Start, driving the pumps as held.  Both
/// pumps are off on return.
pub fn run_pre_positioning(
    hw: &mut (impl ManualControlPort + ActuatorPort),
    delay: &mut impl DelayNs,
    config: &SystemConfig,
    sink: &mut impl EventSink,
) {
    info!("Use the manual pump buttons to move the water to the right side,");
    info!("just above the top-most electrode.  Press Start when done.");

    let mut positioning = PrePositioning::new();
    let mut outputs = PumpCommands::all_off();

    loop {
        let Poll::Jog {
            left,
            right,
            conflict_began,
        } = positioning.poll(hw.read_buttons())
        else {
            break;
        };

        if conflict_began {
            warn!("Both pump buttons pressed, holding both pumps off");
            sink.emit(&AppEvent::ManualConflict);
        }

        if (left, right) != (outputs.left, outputs.right) {
            drive_jog(hw, &mut outputs, left, right, sink);
        }

        delay.delay_ms(config.manual_poll_ms);
    }

    hw.all_off();
    info!("Start pressed, pre-positioning done");
}

/// Stops first so a direct hand-over never overlaps.  A failed stop holds
/// every start; `outputs` keeps what was actually written, so the next
/// poll retries.
fn drive_jog(
    hw: &mut impl ActuatorPort,
    outputs: &mut PumpCommands,
    left: bool,
    right: bool,
    sink: &mut impl EventSink,
) {
    let before = *outputs;
    let mut stop_pending = false;
    for (side, on) in [(PumpSide::Left, left), (PumpSide::Right, right)] {
        if !on && outputs.is_on(side) {
            match hw.set_pump(side, false) {
                Ok(()) => outputs.set(side, false),
                Err(e) => {
                    warn!("{:?} pump stop failed: {}", side, e);
                    sink.emit(&AppEvent::PumpWriteFailed { side, on: false });
                    stop_pending = true;
                }
            }
        }
    }
    if !stop_pending {
        for (side, on) in [(PumpSide::Left, left), (PumpSide::Right, right)] {
            if on && !outputs.is_on(side) {
                match hw.set_pump(side, true) {
                    Ok(()) => outputs.set(side, true),
                    Err(e) => {
                        warn!("{:?} pump start failed: {}", side, e);
                        sink.emit(&AppEvent::PumpWriteFailed { side, on: true });
                    }
                }
            }
        }
    }
    if *outputs != before {
        sink.emit(&AppEvent::ManualControl {
            left: outputs.left,
            right: outputs.right,
        });
    }
}

/// Everything between sensor detection and the first transfer cycle.
///
/// Returns a constructed, not yet started, [`AppService`].
pub fn bring_up(
    hw: &mut (impl SensorPort + ActuatorPort + ManualControlPort),
    delay: &mut impl DelayNs,
    config: SystemConfig,
    sink: &mut impl EventSink,
) -> Result<AppService, Error> {
    config.validate()?;

    hw.all_off();
    delay.delay_ms(config.sensor_warmup_ms);

    run_pre_positioning(hw, delay, &config, sink);
    delay.delay_ms(config.pre_position_settle_ms);

    let baseline = Baseline::capture(hw, config.baseline_source)?;
    sink.emit(&AppEvent::BaselineCaptured(*baseline.values()));

    Ok(AppService::new(config, baseline))
}
