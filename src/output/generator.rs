//! Generator State
//!
//! Single owner of everything the user can set about the output. The main
//! loop mutates it in response to input and calls [`Generator::recompute`]
//! to push the result to the hardware.

use crate::config::{DEFAULT_AMPLITUDE, DEFAULT_DUTY, DEFAULT_PERIOD_NS, DEFAULT_WAVEFORM};
use crate::output::bank::SampleBank;
use crate::output::solver::{SolveRequest, TimerPlan, TimerSolver};
use crate::output::waveform::{WaveformShape, WaveformTable};
use crate::platform::{OutputPort, TimerCapabilities};
use crate::types::{
    freq_mhz_to_period_ns, period_ns_to_freq_mhz, CalibrationTrim, Percent, Request, RequestMode,
    WaveformKind,
};

/// Output settings plus the plan currently programmed
#[derive(Clone, Copy, Debug)]
pub struct Generator<const N: usize> {
    solver: TimerSolver,
    shape: WaveformShape,
    mode: RequestMode,
    frequency_mhz: u32,
    period_ns: u32,
    waveform: WaveformKind,
    duty: Percent,
    amplitude: Percent,
    on: bool,
    plan: Option<TimerPlan>,
    table_dirty: bool,
}

impl<const N: usize> Generator<N> {
    /// Create a generator with default settings, output off
    #[must_use]
    pub fn new(caps: TimerCapabilities, trim: CalibrationTrim) -> Self {
        Self {
            solver: TimerSolver::new(caps, trim),
            shape: WaveformShape::DAC,
            mode: RequestMode::Period,
            frequency_mhz: period_ns_to_freq_mhz(DEFAULT_PERIOD_NS),
            period_ns: DEFAULT_PERIOD_NS,
            waveform: DEFAULT_WAVEFORM,
            duty: DEFAULT_DUTY,
            amplitude: DEFAULT_AMPLITUDE,
            on: false,
            plan: None,
            table_dirty: true,
        }
    }

    /// Use a different sample scaling
    #[must_use]
    pub fn with_shape(mut self, shape: WaveformShape) -> Self {
        self.shape = shape;
        self.table_dirty = true;
        self
    }

    /// Requested frequency (mHz)
    #[must_use]
    pub const fn frequency_mhz(&self) -> u32 {
        self.frequency_mhz
    }

    /// Requested period (ns)
    #[must_use]
    pub const fn period_ns(&self) -> u32 {
        self.period_ns
    }

    /// Which of frequency/period is authoritative
    #[must_use]
    pub const fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Selected waveform
    #[must_use]
    pub const fn waveform(&self) -> WaveformKind {
        self.waveform
    }

    /// Square duty cycle
    #[must_use]
    pub const fn duty(&self) -> Percent {
        self.duty
    }

    /// Table amplitude
    #[must_use]
    pub const fn amplitude(&self) -> Percent {
        self.amplitude
    }

    /// Output enabled
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Calibration trim in use
    #[must_use]
    pub const fn calibration(&self) -> CalibrationTrim {
        self.solver.calibration()
    }

    /// The solver
    #[must_use]
    pub const fn solver(&self) -> &TimerSolver {
        &self.solver
    }

    /// Plan from the last recompute
    #[must_use]
    pub const fn plan(&self) -> Option<&TimerPlan> {
        self.plan.as_ref()
    }

    /// What the solver will be asked for
    #[must_use]
    pub const fn request(&self) -> SolveRequest {
        let target = match self.mode {
            RequestMode::Frequency => Request::FrequencyMilliHz(self.frequency_mhz),
            RequestMode::Period => Request::PeriodNs(self.period_ns),
        };
        SolveRequest {
            target,
            waveform: self.waveform,
            duty: self.duty,
        }
    }

    /// Set the frequency; the period follows
    pub fn set_frequency_mhz(&mut self, frequency_mhz: u32) {
        self.mode = RequestMode::Frequency;
        self.frequency_mhz = frequency_mhz;
        self.period_ns = freq_mhz_to_period_ns(frequency_mhz);
    }

    /// Set the period; the frequency follows
    pub fn set_period_ns(&mut self, period_ns: u32) {
        self.mode = RequestMode::Period;
        self.period_ns = period_ns;
        self.frequency_mhz = period_ns_to_freq_mhz(period_ns);
    }

    /// Choose which quantity is authoritative without changing either
    pub fn set_mode(&mut self, mode: RequestMode) {
        self.mode = mode;
    }

    /// Select a waveform
    pub fn set_waveform(&mut self, waveform: WaveformKind) {
        if waveform != self.waveform {
            self.waveform = waveform;
            self.table_dirty = true;
        }
    }

    /// Set the square duty cycle
    pub fn set_duty(&mut self, duty: Percent) {
        self.duty = duty;
    }

    /// Set the table amplitude
    pub fn set_amplitude(&mut self, amplitude: Percent) {
        if amplitude != self.amplitude {
            self.amplitude = amplitude;
            self.table_dirty = true;
        }
    }

    /// Enable or disable the output
    pub fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    /// Change the calibration trim
    pub fn set_calibration(&mut self, trim: CalibrationTrim) {
        self.solver.set_calibration(trim);
    }

    /// Solve, adopt the achieved value and program the hardware
    ///
    /// The sample table is rebuilt first if waveform or amplitude changed,
    /// then the timer registers are written inside one critical section.
    pub fn recompute<P: OutputPort>(&mut self, port: &mut P, bank: &SampleBank<N>) -> TimerPlan {
        let plan = self.solver.solve(self.request());

        match plan.actual {
            Request::FrequencyMilliHz(mhz) => {
                self.frequency_mhz = mhz;
                self.period_ns = freq_mhz_to_period_ns(mhz);
            }
            Request::PeriodNs(ns) => {
                self.period_ns = ns;
                self.frequency_mhz = period_ns_to_freq_mhz(ns);
            }
        }

        if plan.waveform != self.waveform {
            self.waveform = plan.waveform;
            self.table_dirty = true;
        }

        if self.table_dirty && !self.waveform.is_square() {
            let table = WaveformTable::<N>::build(self.waveform, self.amplitude, self.shape);
            bank.install(&table);
            self.table_dirty = false;
        }

        let write = plan.register_write(self.on);
        critical_section::with(|cs| port.apply(cs, write));

        info!("output {} {} on={}", plan.actual, self.waveform, self.on);
        self.plan = Some(plan);
        plan
    }
}
