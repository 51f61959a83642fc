//! Button Input
//!
//! Debounces the four front-panel buttons from level samples taken every
//! UI tick. Each button keeps the last eight samples as a bit history:
//!
//! - `0xFE` (held for seven ticks, then released) fires one press on release
//! - `0xFF` (held) fires a press every [`BUTTON_REPEAT_TICKS`] ticks
//!
//! Bounces shorter than seven ticks never produce an event.

use heapless::Vec;

use crate::config::BUTTON_REPEAT_TICKS;

const HELD: u8 = 0xFF;
const RELEASED: u8 = 0xFE;

/// Front-panel buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    /// Increase the selected value
    Up,
    /// Decrease the selected value
    Down,
    /// Next parameter / digit
    Next,
    /// Previous parameter / digit
    Prev,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Button {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Up => defmt::write!(f, "Up"),
            Self::Down => defmt::write!(f, "Down"),
            Self::Next => defmt::write!(f, "Next"),
            Self::Prev => defmt::write!(f, "Prev"),
        }
    }
}

/// Debounce state for one button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonDebouncer {
    history: u8,
    count: u8,
}

impl ButtonDebouncer {
    /// Create a released button
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: 0,
            count: 0,
        }
    }

    /// Feed one sample; returns true if a press event fires
    pub fn sample(&mut self, pressed: bool) -> bool {
        self.history <<= 1;
        let mut fire = false;
        if pressed {
            self.history |= 1;
            if self.history == HELD {
                self.count += 1;
                if self.count >= BUTTON_REPEAT_TICKS {
                    // Auto-repeat
                    self.count = 0;
                    fire = true;
                }
            }
        } else {
            self.count = 0;
        }
        if self.history == RELEASED {
            fire = true;
        }
        fire
    }

    /// True once the button has been down for eight samples
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.history == HELD
    }

    /// Raw sample history, newest in bit 0
    #[must_use]
    pub const fn history(&self) -> u8 {
        self.history
    }
}

/// Button levels sampled on one tick (true = pressed)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonLevels {
    /// Up button
    pub up: bool,
    /// Down button
    pub down: bool,
    /// Next button
    pub next: bool,
    /// Previous button
    pub prev: bool,
}

/// Result of one scan
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ButtonScan {
    /// Press events, in button order
    pub events: Vec<Button, 4>,
    /// Up, Down and Next just became held together
    ///
    /// Press events are suppressed from this scan until all three are
    /// released again.
    pub reset_chord: bool,
}

/// All four buttons
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonPad {
    up: ButtonDebouncer,
    down: ButtonDebouncer,
    next: ButtonDebouncer,
    prev: ButtonDebouncer,
    chord_latched: bool,
}

impl ButtonPad {
    /// Create a pad with all buttons released
    #[must_use]
    pub const fn new() -> Self {
        Self {
            up: ButtonDebouncer::new(),
            down: ButtonDebouncer::new(),
            next: ButtonDebouncer::new(),
            prev: ButtonDebouncer::new(),
            chord_latched: false,
        }
    }

    /// Sample all buttons once
    pub fn scan(&mut self, levels: ButtonLevels) -> ButtonScan {
        let mut scan = ButtonScan::default();
        let samples = [
            (Button::Up, &mut self.up, levels.up),
            (Button::Down, &mut self.down, levels.down),
            (Button::Next, &mut self.next, levels.next),
            (Button::Prev, &mut self.prev, levels.prev),
        ];
        for (button, debouncer, pressed) in samples {
            if debouncer.sample(pressed) {
                // At most four buttons, capacity is four
                let _ = scan.events.push(button);
            }
        }

        let chord = self.up.is_held() && self.down.is_held() && self.next.is_held();
        scan.reset_chord = chord && !self.chord_latched;
        if chord {
            self.chord_latched = true;
        }
        if self.chord_latched {
            // The chord is a command of its own, not three presses, and
            // letting go of it is not either
            scan.events.clear();
            if !levels.up && !levels.down && !levels.next {
                self.chord_latched = false;
            }
        }
        scan
    }
}
