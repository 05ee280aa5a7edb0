//! Top-of-chamber float switch.
//!
//! A single digital input.  The switch is normally closed and wired to a
//! pull-up, so by default a HIGH level means liquid has lifted the float.
//! No calibration: the level is read directly every cycle.

use embedded_hal::digital::InputPin;

use crate::error::SensorError;
use crate::fsm::context::FloatState;

pub struct FloatSwitch<P> {
    pin: P,
    trip_high: bool,
}

impl<P: InputPin> FloatSwitch<P> {
    /// `trip_high`: whether a HIGH input level means tripped.
    pub fn new(pin: P, trip_high: bool) -> Self {
        Self { pin, trip_high }
    }

    pub fn read(&mut self) -> Result<FloatState, SensorError> {
        let high = self.pin.is_high().map_err(|_| SensorError::Bus)?;
        Ok(if high == self.trip_high {
            FloatState::Tripped
        } else {
            FloatState::Dry
        })
    }
}
