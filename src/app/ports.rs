//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, pumps, buttons, event sinks) implement these
//! traits.  [`AppService`](super::service::AppService) and the bring-up
//! sequence consume them via generics, so the transfer logic never touches
//! hardware directly and runs unchanged against the mocks in `tests/`.

use crate::error::{ActuatorError, SensorError};
use crate::fsm::context::{FloatState, PumpSide};

pub use crate::drivers::button::ButtonSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: raw electrode counts and the float switch.
///
/// Baseline subtraction happens in [`crate::calibration`]; implementations
/// return what the hardware reports.
pub trait SensorPort {
    /// Filtered capacitance count for one electrode (0..=1023).
    fn read_channel(&mut self, channel: u8) -> Result<u16, SensorError>;

    /// The controller's own tracked baseline for one electrode, scaled to
    /// the same range as [`read_channel`](Self::read_channel).
    fn read_chip_baseline(&mut self, channel: u8) -> Result<u16, SensorError>;

    fn read_float(&mut self) -> Result<FloatState, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the two transfer pumps.
pub trait ActuatorPort {
    /// Switch one pump.  On `Err` the output must be assumed unchanged;
    /// callers keep the old state and write it again on the next pass.
    fn set_pump(&mut self, side: PumpSide, on: bool) -> Result<(), ActuatorError>;

    /// Kill both pumps (safe shutdown).  Attempts both sides even if one
    /// write fails; failures are logged by the adapter.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Manual control port (operator → domain, setup phase only)
// ───────────────────────────────────────────────────────────────

pub trait ManualControlPort {
    fn read_buttons(&mut self) -> ButtonSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, a
/// test recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
