//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for the two-chamber transfer demo:
//! operator setup, baseline capture, and the cyclic transfer loop with
//! its stall and fault handling.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod setup;
