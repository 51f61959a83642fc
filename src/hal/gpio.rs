//! GPIO Abstractions
//!
//! Front-panel buttons and the status LED.

use embassy_stm32::gpio::{Input, Output};

use crate::input::ButtonLevels;

/// Status LED driver
///
/// Lit while the output is enabled.
pub struct StatusLed<'d> {
    pin: Output<'d>,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self { pin }
    }

    /// Show the output state
    pub fn set(&mut self, on: bool) {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

/// The four front-panel buttons (active low with pull-ups)
pub struct Buttons<'d> {
    up: Input<'d>,
    down: Input<'d>,
    next: Input<'d>,
    prev: Input<'d>,
}

impl<'d> Buttons<'d> {
    /// Create the button set
    #[must_use]
    pub fn new(up: Input<'d>, down: Input<'d>, next: Input<'d>, prev: Input<'d>) -> Self {
        Self {
            up,
            down,
            next,
            prev,
        }
    }

    /// Sample all four pins
    #[must_use]
    pub fn levels(&self) -> ButtonLevels {
        ButtonLevels {
            up: self.up.is_low(),
            down: self.down.is_low(),
            next: self.next.is_low(),
            prev: self.prev.is_low(),
        }
    }
}
