//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the signal generator.
//! Clock frequencies, UI timing, display layout and output scaling are
//! centralized here; timer capabilities live in [`crate::platform`].

use crate::types::{Percent, WaveformKind};

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// UI tick rate (button sampling, settle counter, settings commit)
pub const UI_TICK_HZ: u32 = 50;

/// UI tick period in milliseconds
pub const UI_TICK_MS: u64 = 1000 / UI_TICK_HZ as u64;

/// Ticks to wait after the last digit edit before re-solving (~3 s)
pub const EDIT_SETTLE_TICKS: u16 = 150;

/// Ticks to wait after the last settings change before writing flash
pub const STORE_COMMIT_DELAY_TICKS: u8 = 30;

/// Ticks between auto-repeat events while a button is held
pub const BUTTON_REPEAT_TICKS: u8 = 10;

/// Width of the main frequency field in characters
pub const MAIN_VALUE_WIDTH: usize = 6;

/// Width of the period field on the parameter line
pub const PARAMETER_VALUE_WIDTH: usize = 8;

/// Default output period (1 ms)
pub const DEFAULT_PERIOD_NS: u32 = 1_000_000;

/// Default duty cycle
pub const DEFAULT_DUTY: Percent = Percent::HALF;

/// Default amplitude
pub const DEFAULT_AMPLITUDE: Percent = Percent::FULL;

/// Default waveform
pub const DEFAULT_WAVEFORM: WaveformKind = WaveformKind::Square;

/// Default display contrast
pub const DEFAULT_CONTRAST: u8 = 64;

/// Largest selectable display contrast
pub const MAX_CONTRAST: u8 = 127;

/// Samples per waveform cycle
pub const WAVEFORM_TABLE_LEN: usize = 32;

/// DAC resolution in bits
pub const DAC_BITS: u32 = 12;

/// DAC code at 0 V output offset
pub const DAC_MID_SCALE: i32 = 1 << (DAC_BITS - 1);

/// Peak deviation from mid-scale at 100 % amplitude
pub const DAC_FULL_SCALE_AMPLITUDE: i32 = DAC_MID_SCALE - 1;

/// Shortest timer period the solver will program, in nanoseconds
pub const MIN_TIMER_PERIOD_NS: u32 = 250;

/// Longest timer period the solver will program, in nanoseconds
pub const MAX_TIMER_PERIOD_NS: u32 = 4_000_000_000;

/// Lowest frequency the editor accepts (one 4 s timer period)
pub const MIN_FREQUENCY_MHZ: u32 = 250;

/// Highest frequency the editor accepts (one 250 ns timer period)
pub const MAX_FREQUENCY_MHZ: u32 = 4_000_000_000;

/// I2C bus frequency for the display
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// SSD1306 OLED I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED (directly on MCU)
    pub const LED_STATUS: &str = "PA5";

    /// I2C1 SCL (display)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (display)
    pub const I2C1_SDA: &str = "PB9";

    /// Up button (active low)
    pub const BUTTON_UP: &str = "PC0";

    /// Down button (active low)
    pub const BUTTON_DOWN: &str = "PC1";

    /// Next button (active low)
    pub const BUTTON_NEXT: &str = "PC2";

    /// Previous button (active low)
    pub const BUTTON_PREV: &str = "PC3";

    /// Analog waveform output (DAC1 channel 1)
    pub const WAVE_OUT: &str = "PA4";

    /// Square wave output (TIM3 channel 1)
    pub const SQUARE_OUT: &str = "PA6";
}

/// Timer assignments
pub mod timers {
    //! Hardware timer assignments

    /// Output timer: square wave compare channel and sample interrupt
    pub const OUTPUT: u8 = 3;

    /// embassy-time driver
    pub const TIME_DRIVER: u8 = 5;
}

/// Flash layout
pub mod flash {
    //! Flash locations used for persistent settings

    /// Offset of the settings page from the start of flash (last 2 KiB page)
    pub const SETTINGS_OFFSET: u32 = 0x7_F800;

    /// Flash page size
    pub const PAGE_SIZE: u32 = 2048;

    /// Flash programming granularity (double word)
    pub const WRITE_SIZE: usize = 8;
}
