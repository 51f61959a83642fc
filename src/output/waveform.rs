//! Waveform Table Synthesis
//!
//! Builds one cycle of samples for the sample interrupt to replay.
//!
//! Only the first quarter is computed. Square and sine mirror it into the
//! second quarter; triangle ramps to its peak at `N/4` and mirrors back
//! down. Every kind then fills the second half by point reflection through
//! mid-scale, so `sample[i] + sample[i + N/2] == 2 × mid` holds exactly.
//! A final pass scales the deviation from mid-scale by the amplitude.

#[cfg(feature = "embedded")]
use micromath::F32Ext;

use fixed::types::{I32F32, U0F32};

use crate::config::{DAC_FULL_SCALE_AMPLITUDE, DAC_MID_SCALE};
use crate::types::{Percent, WaveformKind};

/// `sin(kπ/32)` for k = 1, 3, …, 15: the sample phases of a 32-entry quarter
const SINE_QUARTER_32: [U0F32; 8] = [
    U0F32::from_bits(420_980_412),
    U0F32::from_bits(1_246_763_195),
    U0F32::from_bits(2_024_633_568),
    U0F32::from_bits(2_724_698_408),
    U0F32::from_bits(3_320_054_617),
    U0F32::from_bits(3_787_822_988),
    U0F32::from_bits(4_110_027_446),
    U0F32::from_bits(4_274_285_855),
];

/// Output scaling of a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveformShape {
    /// Sample value for 0 V
    pub mid_scale: i32,
    /// Peak deviation from mid-scale at 100 % amplitude
    pub full_scale_amplitude: i32,
}

impl WaveformShape {
    /// 12-bit DAC centred at code 2048
    pub const DAC: Self = Self {
        mid_scale: DAC_MID_SCALE,
        full_scale_amplitude: DAC_FULL_SCALE_AMPLITUDE,
    };

    /// Create a shape
    #[must_use]
    pub const fn new(mid_scale: i32, full_scale_amplitude: i32) -> Self {
        Self {
            mid_scale,
            full_scale_amplitude,
        }
    }
}

/// One output cycle of `N` samples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveformTable<const N: usize> {
    samples: [i32; N],
}

impl<const N: usize> WaveformTable<N> {
    const VALID_LEN: () = assert!(N >= 4 && N % 4 == 0, "table length must be a multiple of 4");

    /// A table holding `level` everywhere
    #[must_use]
    pub const fn flat(level: i32) -> Self {
        let () = Self::VALID_LEN;
        Self {
            samples: [level; N],
        }
    }

    /// Synthesize a table
    #[must_use]
    pub fn build(kind: WaveformKind, amplitude: Percent, shape: WaveformShape) -> Self {
        let () = Self::VALID_LEN;
        let quarter = N / 4;
        let half = N / 2;
        let mid = shape.mid_scale;
        let peak = shape.full_scale_amplitude;
        let mut samples = [mid; N];

        match kind {
            WaveformKind::Square => {
                samples[..quarter].fill(mid + peak);
                mirror_quadrant(&mut samples[..half]);
            }
            WaveformKind::Triangle => {
                for (i, sample) in samples[..=quarter].iter_mut().enumerate() {
                    *sample = mid + ramp(peak, i, quarter);
                }
                for j in 1..quarter {
                    samples[quarter + j] = samples[quarter - j];
                }
            }
            WaveformKind::Sine => {
                for (i, sample) in samples[..quarter].iter_mut().enumerate() {
                    *sample = mid + sine_point(peak, i, N);
                }
                mirror_quadrant(&mut samples[..half]);
            }
        }

        for i in 0..half {
            samples[i + half] = 2 * mid - samples[i];
        }

        let amplitude = i32::from(amplitude.get());
        if amplitude != 100 {
            for sample in &mut samples {
                *sample = mid + (*sample - mid) * amplitude / 100;
            }
        }

        Self { samples }
    }

    /// All samples
    #[must_use]
    pub const fn samples(&self) -> &[i32; N] {
        &self.samples
    }

    /// Sample at `index`, wrapping around the cycle
    #[must_use]
    pub const fn get(&self, index: usize) -> i32 {
        self.samples[index % N]
    }

    /// Samples per cycle
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always false; tables hold at least four samples
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Second quarter of `half` = first quarter reversed
fn mirror_quadrant(half: &mut [i32]) {
    let len = half.len();
    for i in 0..len / 2 {
        half[len - 1 - i] = half[i];
    }
}

/// `round(peak × i / steps)`
fn ramp(peak: i32, i: usize, steps: usize) -> i32 {
    let (Ok(i), Ok(steps)) = (i64::try_from(i), i64::try_from(steps)) else {
        return peak;
    };
    let scaled = 2 * i64::from(peak) * i + steps;
    i32::try_from(scaled.div_euclid(2 * steps)).unwrap_or(peak)
}

/// `round(peak × sin((2i + 1)π / len))`
fn sine_point(peak: i32, i: usize, len: usize) -> i32 {
    let coeff = if len == 32 {
        I32F32::from_num(SINE_QUARTER_32[i])
    } else {
        #[allow(clippy::cast_precision_loss)]
        let phase = (2 * i + 1) as f32 * core::f32::consts::PI / len as f32;
        I32F32::from_num(phase.sin())
    };
    (I32F32::from_num(peak) * coeff).round().to_num::<i32>()
}
