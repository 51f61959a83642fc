//! Hardware Abstraction Layer
//!
//! Thin adapters between the STM32G474 peripherals and the host-testable
//! core. Register values are computed elsewhere; this module only loads
//! them.

pub mod dac;
pub mod flash;
pub mod gpio;
pub mod timer;
