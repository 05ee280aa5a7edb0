//! GPIO / peripheral pin assignments for the AquaAuto controller board.
//!
//! Single source of truth: `main` builds every pin driver from these
//! numbers rather than hard-coding them.

// ---------------------------------------------------------------------------
// Pump solid-state relays (120 V AC pumps)
// ---------------------------------------------------------------------------

/// Digital output: left-chamber pump SSR.  HIGH = pump on.
pub const PUMP_LEFT_GPIO: i32 = 2;
/// Digital output: right-chamber pump SSR.  HIGH = pump on.
pub const PUMP_RIGHT_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Float switch at the top of the left chamber.  Normally closed,
/// internal pull-up; HIGH = tripped.
pub const FLOAT_TOP_GPIO: i32 = 5;

/// I²C bus to the MPR121 capacitive controller (right-chamber level ladder).
pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// I²C bus clock.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Manual pre-positioning buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_PUMP_LEFT_GPIO: i32 = 6;
pub const BUTTON_PUMP_RIGHT_GPIO: i32 = 7;
pub const BUTTON_START_GPIO: i32 = 10;
