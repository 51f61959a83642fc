//! Shared types used across the signal generator firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

/// Output waveform
///
/// Ordered `Square < Triangle < Sine`; selection cycles through them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WaveformKind {
    /// Timer compare output toggles the pin directly
    #[default]
    Square,
    /// Linear ramp up and down, played from the sample table
    Triangle,
    /// Sine, played from the sample table
    Sine,
}

impl WaveformKind {
    /// All waveforms in selection order
    pub const ALL: [Self; 3] = [Self::Square, Self::Triangle, Self::Sine];

    /// Decode a stored index, returns None if out of range
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Square),
            1 => Some(Self::Triangle),
            2 => Some(Self::Sine),
            _ => None,
        }
    }

    /// Index used for persistence
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Square => 0,
            Self::Triangle => 1,
            Self::Sine => 2,
        }
    }

    /// Cycle to the next waveform
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Square => Self::Triangle,
            Self::Triangle => Self::Sine,
            Self::Sine => Self::Square, // Wrap around
        }
    }

    /// Cycle to the previous waveform
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Square => Self::Sine, // Wrap around
            Self::Triangle => Self::Square,
            Self::Sine => Self::Triangle,
        }
    }

    /// True for the waveform the timer generates without a sample table
    #[must_use]
    pub const fn is_square(self) -> bool {
        matches!(self, Self::Square)
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::Sine => "sine",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WaveformKind {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

/// Which quantity the user last set
///
/// The solver works from this quantity; the other one is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// Period in nanoseconds is authoritative
    #[default]
    Period,
    /// Frequency in millihertz is authoritative
    Frequency,
}

impl RequestMode {
    /// Decode a stored index, returns None if out of range
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Period),
            1 => Some(Self::Frequency),
            _ => None,
        }
    }

    /// Index used for persistence
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Period => 0,
            Self::Frequency => 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RequestMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Period => defmt::write!(f, "period"),
            Self::Frequency => defmt::write!(f, "frequency"),
        }
    }
}

/// A requested (or achieved) output timing
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Output frequency in millihertz
    FrequencyMilliHz(u32),
    /// Output period in nanoseconds
    PeriodNs(u32),
}

impl Request {
    /// The raw magnitude regardless of unit
    #[must_use]
    pub const fn magnitude(self) -> u32 {
        match self {
            Self::FrequencyMilliHz(v) | Self::PeriodNs(v) => v,
        }
    }

    /// The mode this request is expressed in
    #[must_use]
    pub const fn mode(self) -> RequestMode {
        match self {
            Self::FrequencyMilliHz(_) => RequestMode::Frequency,
            Self::PeriodNs(_) => RequestMode::Period,
        }
    }

    /// Same unit, different magnitude
    #[must_use]
    pub const fn with_magnitude(self, value: u32) -> Self {
        match self {
            Self::FrequencyMilliHz(_) => Self::FrequencyMilliHz(value),
            Self::PeriodNs(_) => Self::PeriodNs(value),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyMilliHz(v) => write!(f, "Request({v} mHz)"),
            Self::PeriodNs(v) => write!(f, "Request({v} ns)"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Request {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::FrequencyMilliHz(v) => defmt::write!(f, "{} mHz", v),
            Self::PeriodNs(v) => defmt::write!(f, "{} ns", v),
        }
    }
}

/// Convert a frequency in millihertz to a period in nanoseconds
///
/// Rounds to nearest; zero maps to the longest representable period.
#[must_use]
pub const fn freq_mhz_to_period_ns(freq_mhz: u32) -> u32 {
    reciprocal_1e12(freq_mhz)
}

/// Convert a period in nanoseconds to a frequency in millihertz
///
/// Rounds to nearest; zero maps to the highest representable frequency.
#[must_use]
pub const fn period_ns_to_freq_mhz(period_ns: u32) -> u32 {
    reciprocal_1e12(period_ns)
}

const fn reciprocal_1e12(value: u32) -> u32 {
    if value == 0 {
        return u32::MAX;
    }
    let v = value as u64;
    let r = (1_000_000_000_000 + v / 2) / v;
    if r > u32::MAX as u64 {
        u32::MAX
    } else {
        r as u32
    }
}

/// Percentage in the range 0..=100
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(u8);

impl Percent {
    /// 0 %
    pub const ZERO: Self = Self(0);

    /// 50 %
    pub const HALF: Self = Self(50);

    /// 100 %
    pub const FULL: Self = Self(100);

    /// Create a percentage, returns None above 100
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 100 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a percentage, clamping to 100
    #[must_use]
    pub const fn saturating(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Get the value
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Step up by one, wrapping 100 to 0
    #[must_use]
    pub const fn wrapping_up(self) -> Self {
        if self.0 >= 100 {
            Self(0)
        } else {
            Self(self.0 + 1)
        }
    }

    /// Step down by one, wrapping 0 to 100
    #[must_use]
    pub const fn wrapping_down(self) -> Self {
        if self.0 == 0 {
            Self(100)
        } else {
            Self(self.0 - 1)
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Percent {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.0);
    }
}

/// Two-stage clock calibration trim
///
/// Each step perturbs the assumed timer clock by a platform-specific
/// number of hertz (see [`crate::platform::CalibrationModel`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationTrim {
    /// Coarse trim
    pub medium: i8,
    /// Fine trim
    pub fine: i8,
}

impl CalibrationTrim {
    /// No trim (cold start default)
    pub const ZERO: Self = Self { medium: 0, fine: 0 };

    /// Create a trim pair
    #[must_use]
    pub const fn new(medium: i8, fine: i8) -> Self {
        Self { medium, fine }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CalibrationTrim {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Trim(medium={}, fine={})", self.medium, self.fine);
    }
}

/// Direction of an edit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Increment
    Up,
    /// Decrement
    Down,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Up => defmt::write!(f, "up"),
            Self::Down => defmt::write!(f, "down"),
        }
    }
}

/// Power-of-1000 scale applied to a displayed value
///
/// Step 0 is the base unit (millihertz or nanoseconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitStep(u8);

impl UnitStep {
    /// Largest supported step
    pub const MAX: u8 = 3;

    /// Base unit
    pub const BASE: Self = Self(0);

    /// Create a step, returns None above 3
    #[must_use]
    pub const fn new(step: u8) -> Option<Self> {
        if step <= Self::MAX {
            Some(Self(step))
        } else {
            None
        }
    }

    /// Create a step, clamping to 3
    #[must_use]
    pub const fn saturating(step: u8) -> Self {
        if step > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(step)
        }
    }

    /// Get the step index
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// 1000 raised to this step
    #[must_use]
    pub const fn scale(self) -> u32 {
        match self.0 {
            0 => 1,
            1 => 1_000,
            2 => 1_000_000,
            _ => 1_000_000_000,
        }
    }

    /// SI prefix when the base unit is millihertz
    #[must_use]
    pub const fn frequency_prefix(self) -> char {
        match self.0 {
            0 => 'm',
            1 => ' ',
            2 => 'k',
            _ => 'M',
        }
    }

    /// SI prefix when the base unit is nanoseconds
    #[must_use]
    pub const fn period_prefix(self) -> char {
        match self.0 {
            0 => 'n',
            1 => 'u',
            2 => 'm',
            _ => ' ',
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for UnitStep {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "x1000^{}", self.0);
    }
}
