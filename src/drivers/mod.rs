//! Actuator and operator-input drivers.

pub mod button;
pub mod pump;
