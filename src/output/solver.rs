//! Timer Register Solver
//!
//! Finds the prescaler / period / compare register values that reproduce a
//! requested frequency or period as closely as the timer clock allows.
//!
//! # Theory of Operation
//!
//! The timer counts `ticks` prescaled clock cycles per period, so one timer
//! period lasts `ticks × divisor / f_clk`. Square output uses one timer
//! period per output cycle; table-driven waveforms step one sample per timer
//! period and therefore need `oversample_ratio` periods per output cycle.
//!
//! The ideal count is the exact rational
//!
//! ```text
//!   period mode:    period_ns × f_clk / (1e9 × ratio)
//!   frequency mode: f_clk × 1000 / (freq_mHz × ratio)
//! ```
//!
//! evaluated in 64-bit integers with a single rounding per prescaler
//! candidate. `f_clk × 1000` is computed once per calibration change.
//! The achieved value is derived from the chosen integers, never from the
//! request, so re-solving the achieved value reproduces the same plan.

use crate::platform::{Prescaler, RegisterWrite, TimerCapabilities};
use crate::types::{CalibrationTrim, Percent, Request, WaveformKind};

/// Nanoseconds per second
const NS_PER_S: u64 = 1_000_000_000;

/// Millihertz-nanoseconds per unit (1 Hz × 1 s)
const MHZ_NS: u64 = 1_000_000_000_000;

/// Millihertz per hertz
const MHZ_PER_HZ: u64 = 1_000;

/// What the solver is asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveRequest {
    /// Requested frequency or period
    pub target: Request,
    /// Requested waveform
    pub waveform: WaveformKind,
    /// Square output duty cycle
    pub duty: Percent,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SolveRequest {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Solve({}, {}, {})", self.target, self.waveform, self.duty);
    }
}

/// Register values and the output they actually produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerPlan {
    /// Chosen prescaler
    pub prescaler: Prescaler,
    /// Auto-reload value (`ticks - 1`)
    pub period_register: u32,
    /// Square output compare value
    pub compare_register: u32,
    /// Prescaled clock cycles per timer period
    pub ticks: u32,
    /// Achieved frequency or period, in the unit of the request
    pub actual: Request,
    /// Waveform the plan is valid for
    pub waveform: WaveformKind,
    /// The request asked for a table waveform that is too fast to sample
    pub forced_square: bool,
}

impl TimerPlan {
    /// Achieved magnitude (mHz or ns)
    #[must_use]
    pub const fn actual_magnitude(&self) -> u32 {
        self.actual.magnitude()
    }

    /// Register values for the platform adapter
    #[must_use]
    pub const fn register_write(&self, enabled: bool) -> RegisterWrite {
        RegisterWrite {
            prescaler_bits: self.prescaler.bits,
            period_register: self.period_register,
            compare_register: self.compare_register,
            square: self.waveform.is_square(),
            enabled,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerPlan {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Plan({}, ticks={}, cmp={}, actual={}, {}{})",
            self.prescaler,
            self.ticks,
            self.compare_register,
            self.actual,
            self.waveform,
            if self.forced_square { " forced" } else { "" }
        );
    }
}

/// Solver bound to one timer and one calibration
#[derive(Clone, Copy, Debug)]
pub struct TimerSolver {
    caps: TimerCapabilities,
    trim: CalibrationTrim,
    clock_hz: u64,
    freq_numerator: u64,
}

impl TimerSolver {
    /// Create a solver for a timer with the given trim
    #[must_use]
    pub fn new(caps: TimerCapabilities, trim: CalibrationTrim) -> Self {
        let mut solver = Self {
            caps,
            trim,
            clock_hz: 1,
            freq_numerator: MHZ_PER_HZ,
        };
        solver.set_calibration(trim);
        solver
    }

    /// Change the calibration trim
    pub fn set_calibration(&mut self, trim: CalibrationTrim) {
        self.trim = trim;
        self.clock_hz = self
            .caps
            .calibration
            .effective_clock_hz(self.caps.clock_hz, trim);
        self.freq_numerator = self.clock_hz * MHZ_PER_HZ;
    }

    /// Current calibration trim
    #[must_use]
    pub const fn calibration(&self) -> CalibrationTrim {
        self.trim
    }

    /// Timer descriptor
    #[must_use]
    pub const fn capabilities(&self) -> &TimerCapabilities {
        &self.caps
    }

    /// Timer clock after calibration
    #[must_use]
    pub const fn effective_clock_hz(&self) -> u64 {
        self.clock_hz
    }

    /// One timer clock cycle in nanoseconds, rounded
    #[must_use]
    pub fn clock_period_ns(&self) -> u32 {
        saturate_u32(round_div(NS_PER_S, self.clock_hz))
    }

    /// True if `target` is too fast for a table-driven waveform
    #[must_use]
    pub fn exceeds_table_limit(&self, target: Request) -> bool {
        match target {
            Request::FrequencyMilliHz(mhz) => mhz > self.caps.max_non_square_frequency_mhz,
            Request::PeriodNs(ns) => ns < self.caps.min_non_square_period_ns(),
        }
    }

    /// Compute the register plan for `request`
    ///
    /// Never fails: out-of-range requests are clamped and the plan reports
    /// what the hardware will actually produce.
    #[must_use]
    pub fn solve(&self, request: SolveRequest) -> TimerPlan {
        let forced_square =
            !request.waveform.is_square() && self.exceeds_table_limit(request.target);
        let waveform = if forced_square {
            WaveformKind::Square
        } else {
            request.waveform
        };
        let ratio = if waveform.is_square() {
            1
        } else {
            u64::from(self.caps.oversample_ratio.max(1))
        };

        let (num, den) = self.tick_ratio(request.target, ratio);
        let (prescaler, ticks) = self.choose_prescaler(num, den);

        let compare = (ticks * u64::from(request.duty.get()) + 50) / 100;
        let compare = compare.saturating_sub(1);

        let cycles = ticks * u64::from(prescaler.divisor) * ratio;
        let actual = match request.target {
            Request::PeriodNs(_) => {
                let ns = round_div_wide(u128::from(cycles) * u128::from(NS_PER_S), u128::from(self.clock_hz));
                Request::PeriodNs(saturate_u32(ns).max(1))
            }
            Request::FrequencyMilliHz(_) => {
                Request::FrequencyMilliHz(saturate_u32(round_div(self.freq_numerator, cycles)).max(1))
            }
        };

        if forced_square {
            info!("{} too fast for table output, using square", request.target);
        }

        let plan = TimerPlan {
            prescaler,
            period_register: saturate_u32(ticks - 1),
            compare_register: saturate_u32(compare),
            ticks: saturate_u32(ticks),
            actual,
            waveform,
            forced_square,
        };
        debug!("{} -> {}", request, plan);
        plan
    }

    /// Clamp the request and express the ideal tick count as `num / den`
    fn tick_ratio(&self, target: Request, ratio: u64) -> (u64, u64) {
        let min_ns = u64::from(self.caps.min_period_ns.max(1));
        let max_ns = u64::from(self.caps.max_period_ns).max(min_ns);
        match target {
            Request::PeriodNs(ns) => {
                let ns = u64::from(ns).max(min_ns * ratio).min(max_ns * ratio);
                (ns * self.clock_hz, NS_PER_S * ratio)
            }
            Request::FrequencyMilliHz(mhz) => {
                let lowest = MHZ_NS.div_ceil(max_ns);
                let highest = MHZ_NS / min_ns;
                let scaled = (u64::from(mhz) * ratio).max(lowest).min(highest);
                (self.freq_numerator, scaled)
            }
        }
    }

    /// Smallest prescaler whose rounded tick count fits the counter
    fn choose_prescaler(&self, num: u64, den: u64) -> (Prescaler, u64) {
        let max_ticks = self.caps.max_ticks();
        let found = self.caps.prescalers.iter().find_map(|&p| {
            let div = den * u64::from(p.divisor);
            let ticks = round_div(num, div);
            (ticks <= max_ticks).then_some((p, ticks))
        });
        let (prescaler, ticks) = found.unwrap_or_else(|| {
            // Slowest the hardware can go
            let largest = self
                .caps
                .prescalers
                .last()
                .copied()
                .unwrap_or(Prescaler::new(1, 0));
            (largest, max_ticks)
        });
        (prescaler, ticks.max(1))
    }
}

const fn round_div(num: u64, den: u64) -> u64 {
    if den == 0 {
        return u64::MAX;
    }
    (num + den / 2) / den
}

const fn round_div_wide(num: u128, den: u128) -> u128 {
    if den == 0 {
        return u128::MAX;
    }
    (num + den / 2) / den
}

fn saturate_u32<T: TryInto<u32>>(value: T) -> u32 {
    value.try_into().unwrap_or(u32::MAX)
}
