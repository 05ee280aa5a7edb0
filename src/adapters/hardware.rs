//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the capacitive controller, both pump drivers, the float switch and
//! the manual buttons, exposing them through [`SensorPort`],
//! [`ActuatorPort`] and [`ManualControlPort`].  This is the only module in
//! the system that touches actual hardware.  Every driver is generic over
//! `embedded-hal` 1.0, so the same adapter runs on the ESP-IDF drivers and
//! on host fakes.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::error;

use crate::app::ports::{ActuatorPort, ButtonSnapshot, ManualControlPort, SensorPort};
use crate::drivers::button::ManualButtons;
use crate::drivers::pump::PumpDriver;
use crate::error::{ActuatorError, SensorError};
use crate::fsm::context::{FloatState, PumpSide};
use crate::sensors::float_switch::FloatSwitch;
use crate::sensors::mpr121::Mpr121;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, OUT, IN> {
    mpr121: Mpr121<I2C>,
    pump_left: PumpDriver<OUT>,
    pump_right: PumpDriver<OUT>,
    float: FloatSwitch<IN>,
    buttons: ManualButtons<IN>,
}

impl<I2C, OUT, IN> HardwareAdapter<I2C, OUT, IN>
where
    I2C: I2c,
    OUT: OutputPin,
    IN: InputPin,
{
    /// `mpr121` must already have passed [`Mpr121::init`].
    pub fn new(
        mpr121: Mpr121<I2C>,
        pump_left: PumpDriver<OUT>,
        pump_right: PumpDriver<OUT>,
        float: FloatSwitch<IN>,
        buttons: ManualButtons<IN>,
    ) -> Self {
        Self {
            mpr121,
            pump_left,
            pump_right,
            float,
            buttons,
        }
    }

    pub fn pump_running(&self, side: PumpSide) -> bool {
        match side {
            PumpSide::Left => self.pump_left.is_running(),
            PumpSide::Right => self.pump_right.is_running(),
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C, OUT, IN> SensorPort for HardwareAdapter<I2C, OUT, IN>
where
    I2C: I2c,
    OUT: OutputPin,
    IN: InputPin,
{
    fn read_channel(&mut self, channel: u8) -> Result<u16, SensorError> {
        self.mpr121.filtered_data(channel)
    }

    fn read_chip_baseline(&mut self, channel: u8) -> Result<u16, SensorError> {
        self.mpr121.baseline_data(channel)
    }

    fn read_float(&mut self) -> Result<FloatState, SensorError> {
        self.float.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C, OUT, IN> ActuatorPort for HardwareAdapter<I2C, OUT, IN>
where
    I2C: I2c,
    OUT: OutputPin,
    IN: InputPin,
{
    fn set_pump(&mut self, side: PumpSide, on: bool) -> Result<(), ActuatorError> {
        match side {
            PumpSide::Left => self.pump_left.set(on),
            PumpSide::Right => self.pump_right.set(on),
        }
    }

    fn all_off(&mut self) {
        // Both stops are attempted even if the first fails.
        if let Err(e) = self.pump_left.stop() {
            error!("Left pump stop: {}", e);
        }
        if let Err(e) = self.pump_right.stop() {
            error!("Right pump stop: {}", e);
        }
    }
}

// ── ManualControlPort implementation ──────────────────────────

impl<I2C, OUT, IN> ManualControlPort for HardwareAdapter<I2C, OUT, IN>
where
    I2C: I2c,
    OUT: OutputPin,
    IN: InputPin,
{
    fn read_buttons(&mut self) -> ButtonSnapshot {
        self.buttons.read()
    }
}
