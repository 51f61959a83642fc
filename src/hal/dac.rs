//! DAC Driver
//!
//! Writes waveform samples to DAC1 channel 1 (PA4) from the TIM3 update
//! interrupt.

use embassy_stm32::dac::{DacChannel, Instance, Value};

use crate::config::DAC_BITS;

/// Largest DAC code
const MAX_CODE: u16 = (1 << DAC_BITS) - 1;

/// Output sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DacSample {
    /// 12-bit DAC value (0-4095)
    value: u16,
}

impl DacSample {
    /// Create from raw 12-bit value
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self {
            value: if value > MAX_CODE { MAX_CODE } else { value },
        }
    }

    /// Create from a waveform table entry, clamping to the DAC range
    #[must_use]
    pub fn from_table(sample: i32) -> Self {
        let clamped = sample.clamp(0, i32::from(MAX_CODE));
        Self::from_raw(u16::try_from(clamped).unwrap_or(MAX_CODE))
    }

    /// Get the raw 12-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.value
    }

    /// Convert to embassy DAC value
    #[must_use]
    pub const fn as_dac_value(self) -> Value {
        Value::Bit12Right(self.value)
    }
}

impl Default for DacSample {
    fn default() -> Self {
        Self::from_raw(1 << (DAC_BITS - 1)) // Mid-scale
    }
}

impl defmt::Format for DacSample {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DAC({})", self.value);
    }
}

/// Waveform DAC output
pub struct SampleDac<'d, T: Instance> {
    channel: DacChannel<'d, T, 1>,
}

impl<'d, T: Instance> SampleDac<'d, T> {
    /// Wrap a DAC channel and park it at mid-scale
    #[must_use]
    pub fn new(channel: DacChannel<'d, T, 1>) -> Self {
        let mut dac = Self { channel };
        dac.write(DacSample::default());
        dac
    }

    /// Write a single sample to the DAC
    pub fn write(&mut self, sample: DacSample) {
        self.channel.set(sample.as_dac_value());
    }
}
