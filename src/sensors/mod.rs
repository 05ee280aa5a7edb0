//! Sensor drivers.
//!
//! | Driver        | Hardware                                   |
//! |---------------|--------------------------------------------|
//! | `mpr121`      | 12-channel capacitive controller (ladder)  |
//! | `float_switch`| Normally-closed float at the top of a tank |
//!
//! Both are generic over `embedded-hal` 1.0 traits; the ESP-IDF drivers
//! plug in on target, fakes in tests.  Baseline handling lives in
//! [`crate::calibration`], not here.

pub mod float_switch;
pub mod mpr121;
