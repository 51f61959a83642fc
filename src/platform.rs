//! Platform descriptors and the register-write boundary
//!
//! The numeric core never touches hardware. It is parameterized by a
//! [`TimerCapabilities`] descriptor and hands its results to an
//! [`OutputPort`], which the HAL implements for the real timer and tests
//! implement with a recorder.

use critical_section::CriticalSection;

use crate::config::{MAX_TIMER_PERIOD_NS, MIN_TIMER_PERIOD_NS, SYSTEM_CLOCK_HZ, WAVEFORM_TABLE_LEN};
use crate::types::CalibrationTrim;

/// A legal prescaler setting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prescaler {
    /// Clock division factor
    pub divisor: u32,
    /// Bit pattern written to the prescaler field to select `divisor`
    pub bits: u16,
}

impl Prescaler {
    /// Create a prescaler entry
    #[must_use]
    pub const fn new(divisor: u32, bits: u16) -> Self {
        Self { divisor, bits }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Prescaler {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "/{} ({=u16:#x})", self.divisor, self.bits);
    }
}

/// Linear clock trim model
///
/// `f_effective = f_nominal + hz_per_medium_step * medium + hz_per_fine_step * fine`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationModel {
    /// Clock change per medium step
    pub hz_per_medium_step: i32,
    /// Clock change per fine step
    pub hz_per_fine_step: i32,
}

impl CalibrationModel {
    /// Model scaled to a nominal clock: 100 ppm medium, 1 ppm fine
    #[must_use]
    pub const fn ppm_for(clock_hz: u32) -> Self {
        Self {
            hz_per_medium_step: (clock_hz / 10_000) as i32,
            hz_per_fine_step: (clock_hz / 1_000_000) as i32,
        }
    }

    /// Effective clock for a trim pair, never below 1 Hz
    #[must_use]
    pub fn effective_clock_hz(&self, nominal_hz: u32, trim: CalibrationTrim) -> u64 {
        let hz = i64::from(nominal_hz)
            + i64::from(self.hz_per_medium_step) * i64::from(trim.medium)
            + i64::from(self.hz_per_fine_step) * i64::from(trim.fine);
        u64::try_from(hz.max(1)).unwrap_or(1)
    }
}

/// Everything the timer solver needs to know about the output timer
#[derive(Clone, Copy, Debug)]
pub struct TimerCapabilities {
    /// Nominal timer input clock
    pub clock_hz: u32,
    /// Counter (auto-reload) register width
    pub counter_bits: u8,
    /// Legal prescalers, ascending by divisor
    pub prescalers: &'static [Prescaler],
    /// Clock trim model
    pub calibration: CalibrationModel,
    /// Timer periods per output cycle for table-driven waveforms
    pub oversample_ratio: u32,
    /// Highest output frequency a table-driven waveform may use (mHz)
    pub max_non_square_frequency_mhz: u32,
    /// Shortest timer period the solver will program
    pub min_period_ns: u32,
    /// Longest timer period the solver will program
    pub max_period_ns: u32,
}

impl TimerCapabilities {
    /// Largest tick count the counter can represent
    #[must_use]
    pub const fn max_ticks(&self) -> u64 {
        1 << self.counter_bits
    }

    /// Shortest output period a table-driven waveform may use (ns)
    #[must_use]
    pub const fn min_non_square_period_ns(&self) -> u32 {
        crate::types::freq_mhz_to_period_ns(self.max_non_square_frequency_mhz)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerCapabilities {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Timer({} Hz, {}-bit, {} prescalers)",
            self.clock_hz,
            self.counter_bits,
            self.prescalers.len()
        );
    }
}

const AVR_PRESCALERS: [Prescaler; 5] = [
    Prescaler::new(1, 0b001),
    Prescaler::new(8, 0b010),
    Prescaler::new(64, 0b011),
    Prescaler::new(256, 0b100),
    Prescaler::new(1024, 0b101),
];

/// 16 MHz AVR Timer1: 16-bit counter, clock-select bits CS12..CS10
pub const AVR_TIMER1: TimerCapabilities = TimerCapabilities {
    clock_hz: 16_000_000,
    counter_bits: 16,
    prescalers: &AVR_PRESCALERS,
    calibration: CalibrationModel::ppm_for(16_000_000),
    oversample_ratio: WAVEFORM_TABLE_LEN as u32,
    max_non_square_frequency_mhz: 50_000_000,
    min_period_ns: MIN_TIMER_PERIOD_NS,
    max_period_ns: MAX_TIMER_PERIOD_NS,
};

// PSC holds divisor - 1. A 1-2-5 series keeps the search short.
const STM32_PRESCALERS: [Prescaler; 15] = [
    Prescaler::new(1, 0),
    Prescaler::new(2, 1),
    Prescaler::new(5, 4),
    Prescaler::new(10, 9),
    Prescaler::new(20, 19),
    Prescaler::new(50, 49),
    Prescaler::new(100, 99),
    Prescaler::new(200, 199),
    Prescaler::new(500, 499),
    Prescaler::new(1_000, 999),
    Prescaler::new(2_000, 1_999),
    Prescaler::new(5_000, 4_999),
    Prescaler::new(10_000, 9_999),
    Prescaler::new(20_000, 19_999),
    Prescaler::new(50_000, 49_999),
];

/// STM32G474 TIM3 clocked from the 170 MHz APB1 timer clock
///
/// Table-driven output is limited to 10 kHz, i.e. a 320 kHz sample
/// interrupt.
pub const STM32G474_TIM3: TimerCapabilities = TimerCapabilities {
    clock_hz: SYSTEM_CLOCK_HZ,
    counter_bits: 16,
    prescalers: &STM32_PRESCALERS,
    calibration: CalibrationModel::ppm_for(SYSTEM_CLOCK_HZ),
    oversample_ratio: WAVEFORM_TABLE_LEN as u32,
    max_non_square_frequency_mhz: 10_000_000,
    min_period_ns: MIN_TIMER_PERIOD_NS,
    max_period_ns: MAX_TIMER_PERIOD_NS,
};

/// Values to load into the output timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Prescaler field bit pattern
    pub prescaler_bits: u16,
    /// Auto-reload (TOP) value
    pub period_register: u32,
    /// Compare value for the square output
    pub compare_register: u32,
    /// Square output on the compare pin; otherwise the sample interrupt runs
    pub square: bool,
    /// Output enabled
    pub enabled: bool,
}

#[cfg(feature = "embedded")]
impl defmt::Format for RegisterWrite {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Regs(psc={=u16:#x}, top={}, cmp={}, sq={}, en={})",
            self.prescaler_bits,
            self.period_register,
            self.compare_register,
            self.square,
            self.enabled
        );
    }
}

/// Platform adapter that programs the output timer
///
/// Called with interrupts masked so the sample interrupt never observes a
/// half-written period/compare pair.
pub trait OutputPort {
    /// Load the registers
    fn apply(&mut self, cs: CriticalSection<'_>, write: RegisterWrite);
}

/// Read access to the persisted calibration pair
pub trait CalibrationSource {
    /// Fine trim
    fn fine_cal(&self) -> i8;

    /// Medium trim
    fn medium_cal(&self) -> i8;

    /// Both trims
    fn trim(&self) -> CalibrationTrim {
        CalibrationTrim::new(self.medium_cal(), self.fine_cal())
    }
}
