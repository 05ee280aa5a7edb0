//! AquaAuto transfer-demo firmware library.
//!
//! Exposes the hardware-agnostic modules for the ESP-IDF binary and for
//! host-side integration testing.  Nothing in here depends on ESP-IDF:
//! drivers are generic over `embedded-hal` 1.0, the domain talks to them
//! through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod calibration;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod sensors;
