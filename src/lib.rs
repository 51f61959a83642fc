//! Signal Generator Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! function generator. A hardware timer paces the output: in square mode the
//! timer's compare channel toggles the output pin directly, for triangle and
//! sine the timer interrupt steps through a sample table and writes each
//! sample to the DAC.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  UI (parameters, digit editing)  │  Settings store           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      OUTPUT LAYER                            │
//! │  Timer solver  │  Waveform tables  │  Generator state        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  TIM3  │  DAC  │  I2C  │  Flash  │  GPIO buttons  │  OLED    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Total numeric core**: formatting, solving and synthesis never fail,
//!   out-of-range inputs are clamped
//! - **Type-driven design**: Custom types enforce invariants at compile time
//! - **No unsafe in application code**: All unsafe isolated in the HAL layer
//! - **Functional core, imperative shell**: register values are computed as
//!   plain data and applied by a thin platform adapter

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

// Logging shims; must come first so the macros are visible below.
#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// Provides safe abstractions over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// High-level drivers for external ICs (OLED display).
#[cfg(feature = "embedded")]
pub mod drivers;

/// Engineering-notation formatting and digit editing
pub mod format;

/// Output generation
///
/// Timer register solver, waveform tables and the generator state machine.
pub mod output;

/// Persistent settings with checksum and delayed commit
pub mod settings;

/// Button sampling and debouncing
pub mod input;

/// User Interface
///
/// Parameter menu, digit editing and screen model.
pub mod ui;

/// Platform descriptors and the register-write boundary
pub mod platform;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
