//! Mains pump driver (solid-state relay on a GPIO).
//!
//! On/off only: the SSR switches a 120 V AC pump, so there is no speed
//! control and no direction.  HIGH = pump on.
//!
//! ## Safety contract
//!
//! The two pumps must never be asked to run together.  That is enforced
//! by the transfer machine and the service; this driver is a dumb
//! actuator that remembers what it last wrote.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running,
}

pub struct PumpDriver<P> {
    pin: P,
    state: PumpState,
}

impl<P: OutputPin> PumpDriver<P> {
    /// Take the pin and drive it low immediately.
    pub fn new(mut pin: P) -> Self {
        // Best effort: a failed write here is retried by the first stop().
        let _ = pin.set_low();
        Self {
            pin,
            state: PumpState::Stopped,
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if on { self.start() } else { self.stop() }
    }

    pub fn start(&mut self) -> Result<(), ActuatorError> {
        self.pin
            .set_high()
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = PumpState::Running;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.pin
            .set_low()
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = PumpState::Stopped;
        Ok(())
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PumpState::Running
    }
}
