//! User Interface
//!
//! Parameter selection, digit editing and the screen model for the
//! four-button front panel.
//!
//! `Next`/`Prev` walk the parameter list. On the frequency and period
//! fields they walk the digit cursor first and only move to the
//! neighbouring parameter when the cursor wraps. `Up`/`Down` change the
//! selected value.
//!
//! Digit edits are batched: each one re-arms the [`SettleCounter`] and the
//! generator is recomputed once, after the counter expires. Every other
//! change is applied immediately.

use core::fmt::Write;
use core::sync::atomic::{AtomicU16, Ordering};

use heapless::String;

use crate::config::{
    EDIT_SETTLE_TICKS, MAIN_VALUE_WIDTH, MAX_CONTRAST, MAX_FREQUENCY_MHZ, MAX_TIMER_PERIOD_NS,
    MIN_FREQUENCY_MHZ, MIN_TIMER_PERIOD_NS, PARAMETER_VALUE_WIDTH,
};
use crate::format::{encode, DigitEditor};
use crate::input::Button;
use crate::output::{Generator, SampleBank, TimerPlan};
use crate::platform::OutputPort;
use crate::settings::{Settings, SettingsBackend, SettingsStore};
use crate::types::{Direction, Percent, RequestMode};

/// Prefix of the period field on the parameter line
const PERIOD_LABEL: &str = "T ";

/// Selectable parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parameter {
    /// Output frequency (main value line)
    #[default]
    Frequency,
    /// Output period
    Period,
    /// Waveform
    Waveform,
    /// Square duty cycle
    DutyCycle,
    /// Table amplitude
    Amplitude,
    /// Output on/off
    Output,
    /// Display contrast
    Contrast,
    /// Fine clock trim
    FineCal,
    /// Medium clock trim
    MediumCal,
}

impl Parameter {
    /// All parameters in selection order
    pub const ALL: [Self; 9] = [
        Self::Frequency,
        Self::Period,
        Self::Waveform,
        Self::DutyCycle,
        Self::Amplitude,
        Self::Output,
        Self::Contrast,
        Self::FineCal,
        Self::MediumCal,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }

    /// Following parameter, wrapping
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Preceding parameter, wrapping
    #[must_use]
    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }

    /// Parameter line label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Frequency => "Freq",
            Self::Period => "Period",
            Self::Waveform => "Wave",
            Self::DutyCycle => "Duty",
            Self::Amplitude => "Ampl",
            Self::Output => "Out",
            Self::Contrast => "Contrast",
            Self::FineCal => "Fine cal",
            Self::MediumCal => "Med cal",
        }
    }

    /// True for the fields edited digit by digit
    #[must_use]
    pub const fn is_digit_field(self) -> bool {
        matches!(self, Self::Frequency | Self::Period)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Parameter {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.label());
    }
}

/// Countdown from the last digit edit to the recompute
///
/// Armed by the main loop, decremented by the UI tick. Both sides use a
/// single atomic read-modify-write, so no critical section is needed.
#[derive(Debug, Default)]
pub struct SettleCounter {
    remaining: AtomicU16,
}

impl SettleCounter {
    /// Create an expired counter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
        }
    }

    /// Restart the full settle delay
    pub fn arm(&self) {
        self.remaining.store(EDIT_SETTLE_TICKS, Ordering::Release);
    }

    /// Count one tick; returns true on the tick that expires the counter
    pub fn tick(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok_and(|previous| previous == 1)
    }

    /// Ticks left
    #[must_use]
    pub fn remaining(&self) -> u16 {
        self.remaining.load(Ordering::Acquire)
    }

    /// True once the delay has run out
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.remaining() == 0
    }
}

/// Work the main loop must do after a UI event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    /// Re-solve and program the output
    Recompute,
    /// Send a new contrast to the display
    SetContrast(u8),
    /// Settings were reset: reload contrast and recompute
    Reload,
}

#[cfg(feature = "embedded")]
impl defmt::Format for UiAction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Recompute => defmt::write!(f, "Recompute"),
            Self::SetContrast(c) => defmt::write!(f, "SetContrast({})", c),
            Self::Reload => defmt::write!(f, "Reload"),
        }
    }
}

/// Display line a cursor sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenLine {
    /// Large frequency line
    Value,
    /// Parameter line at the bottom
    Parameter,
}

/// Highlighted character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    /// Line
    pub line: ScreenLine,
    /// Character column
    pub column: usize,
}

/// Text content of the display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    /// Frequency with unit, e.g. `"1.0000kHz"`
    pub value: String<12>,
    /// Waveform and output state, e.g. `"sine on"`
    pub status: String<16>,
    /// Selected parameter and its value
    pub parameter: String<20>,
    /// Digit being edited
    pub cursor: Option<Cursor>,
    /// A digit edit is waiting for the settle delay
    pub pending: bool,
}

/// UI state
#[derive(Clone, Copy, Debug)]
pub struct UiState {
    selected: Parameter,
    frequency_editor: DigitEditor<MAIN_VALUE_WIDTH>,
    period_editor: DigitEditor<PARAMETER_VALUE_WIDTH>,
    edit_pending: bool,
    needs_update: bool,
}

impl UiState {
    /// Create new UI state with the frequency selected
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selected: Parameter::Frequency,
            frequency_editor: DigitEditor::new(MIN_FREQUENCY_MHZ, MAX_FREQUENCY_MHZ),
            period_editor: DigitEditor::new(MIN_TIMER_PERIOD_NS, MAX_TIMER_PERIOD_NS),
            edit_pending: false,
            needs_update: true,
        }
    }

    /// Selected parameter
    #[must_use]
    pub const fn selected(&self) -> Parameter {
        self.selected
    }

    /// A digit edit has not been applied yet
    #[must_use]
    pub const fn is_edit_pending(&self) -> bool {
        self.edit_pending
    }

    /// Check if display needs update
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark as updated
    pub fn mark_updated(&mut self) {
        self.needs_update = false;
    }

    /// Force update
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// Handle one debounced button press
    pub fn handle_button<const N: usize, B: SettingsBackend>(
        &mut self,
        button: Button,
        generator: &mut Generator<N>,
        store: &mut SettingsStore<B>,
        settle: &SettleCounter,
    ) -> Option<UiAction> {
        self.needs_update = true;
        match button {
            Button::Next => {
                self.step_forward(generator);
                None
            }
            Button::Prev => {
                self.step_back(generator);
                None
            }
            Button::Up => self.change(Direction::Up, generator, store, settle),
            Button::Down => self.change(Direction::Down, generator, store, settle),
        }
    }

    /// Report the deferred recompute once the settle delay has expired
    pub fn poll_settled(&mut self, settle: &SettleCounter) -> Option<UiAction> {
        if self.edit_pending && settle.is_settled() {
            self.edit_pending = false;
            Some(UiAction::Recompute)
        } else {
            None
        }
    }

    /// Restore factory settings and apply them
    pub fn reset_settings<const N: usize, B: SettingsBackend>(
        &mut self,
        generator: &mut Generator<N>,
        store: &mut SettingsStore<B>,
    ) -> UiAction {
        info!("settings reset from front panel");
        store.reset();
        restore_settings(generator, store.settings());
        self.edit_pending = false;
        self.needs_update = true;
        UiAction::Reload
    }

    fn step_forward<const N: usize>(&mut self, generator: &Generator<N>) {
        let wrapped = match self.selected {
            Parameter::Frequency => self
                .frequency_editor
                .next(&encode(generator.frequency_mhz())),
            Parameter::Period => self.period_editor.next(&encode(generator.period_ns())),
            _ => true,
        };
        if wrapped {
            self.selected = self.selected.next();
            self.enter(generator, true);
        }
    }

    fn step_back<const N: usize>(&mut self, generator: &Generator<N>) {
        let wrapped = match self.selected {
            Parameter::Frequency => self
                .frequency_editor
                .prev(&encode(generator.frequency_mhz())),
            Parameter::Period => self.period_editor.prev(&encode(generator.period_ns())),
            _ => true,
        };
        if wrapped {
            self.selected = self.selected.prev();
            self.enter(generator, false);
        }
    }

    /// Place the cursor of a newly selected digit field at the end it was
    /// entered from
    fn enter<const N: usize>(&mut self, generator: &Generator<N>, forward: bool) {
        match (self.selected, forward) {
            (Parameter::Frequency, true) => self.frequency_editor.reset(),
            (Parameter::Frequency, false) => self
                .frequency_editor
                .select_last(&encode(generator.frequency_mhz())),
            (Parameter::Period, true) => self.period_editor.reset(),
            (Parameter::Period, false) => self
                .period_editor
                .select_last(&encode(generator.period_ns())),
            _ => {}
        }
    }

    fn change<const N: usize, B: SettingsBackend>(
        &mut self,
        direction: Direction,
        generator: &mut Generator<N>,
        store: &mut SettingsStore<B>,
        settle: &SettleCounter,
    ) -> Option<UiAction> {
        match self.selected {
            Parameter::Frequency => {
                let value = self
                    .frequency_editor
                    .apply(generator.frequency_mhz(), direction);
                generator.set_frequency_mhz(value);
                store.set_mode(RequestMode::Frequency);
                return self.defer(settle);
            }
            Parameter::Period => {
                let value = self.period_editor.apply(generator.period_ns(), direction);
                generator.set_period_ns(value);
                store.set_mode(RequestMode::Period);
                return self.defer(settle);
            }
            Parameter::Waveform => {
                let waveform = match direction {
                    Direction::Up => generator.waveform().next(),
                    Direction::Down => generator.waveform().prev(),
                };
                generator.set_waveform(waveform);
                store.set_waveform(waveform);
            }
            Parameter::DutyCycle => {
                let duty = step_percent(generator.duty(), direction);
                generator.set_duty(duty);
                store.set_duty(duty);
            }
            Parameter::Amplitude => {
                let amplitude = step_percent(generator.amplitude(), direction);
                generator.set_amplitude(amplitude);
                store.set_amplitude(amplitude);
            }
            Parameter::Output => generator.set_on(!generator.is_on()),
            Parameter::Contrast => {
                let contrast = step_contrast(store.settings().contrast, direction);
                store.set_contrast(contrast);
                return Some(UiAction::SetContrast(contrast));
            }
            Parameter::FineCal => {
                store.set_fine_cal(step_trim(store.settings().fine_cal, direction));
                generator.set_calibration(store.settings().trim());
            }
            Parameter::MediumCal => {
                store.set_medium_cal(step_trim(store.settings().medium_cal, direction));
                generator.set_calibration(store.settings().trim());
            }
        }
        // This recompute also covers any digit edit still settling
        self.edit_pending = false;
        Some(UiAction::Recompute)
    }

    fn defer(&mut self, settle: &SettleCounter) -> Option<UiAction> {
        settle.arm();
        self.edit_pending = true;
        None
    }

    /// Build the display content
    #[must_use]
    pub fn screen<const N: usize>(&self, generator: &Generator<N>, settings: &Settings) -> Screen {
        let frequency = encode::<MAIN_VALUE_WIDTH>(generator.frequency_mhz());
        let mut value = String::new();
        let _ = write!(
            value,
            "{}{}Hz",
            frequency,
            frequency.unit_step().frequency_prefix()
        );

        let mut status = String::new();
        let _ = write!(
            status,
            "{} {}",
            generator.waveform().name(),
            if generator.is_on() { "on" } else { "off" }
        );

        let mut parameter = String::new();
        let mut cursor = None;
        match self.selected {
            Parameter::Frequency => {
                let _ = parameter.push_str(Parameter::Frequency.label());
                cursor = self.frequency_editor.column(&frequency).map(|column| Cursor {
                    line: ScreenLine::Value,
                    column,
                });
            }
            Parameter::Period => {
                let period = encode::<PARAMETER_VALUE_WIDTH>(generator.period_ns());
                let _ = write!(
                    parameter,
                    "{}{}{}s",
                    PERIOD_LABEL,
                    period,
                    period.unit_step().period_prefix()
                );
                cursor = self.period_editor.column(&period).map(|column| Cursor {
                    line: ScreenLine::Parameter,
                    column: PERIOD_LABEL.len() + column,
                });
            }
            Parameter::Waveform => {
                let _ = write!(parameter, "Wave: {}", generator.waveform().name());
            }
            Parameter::DutyCycle => {
                let _ = write!(parameter, "Duty: {}%", generator.duty().get());
            }
            Parameter::Amplitude => {
                let _ = write!(parameter, "Ampl: {}%", generator.amplitude().get());
            }
            Parameter::Output => {
                let _ = write!(parameter, "Out: {}", if generator.is_on() { "on" } else { "off" });
            }
            Parameter::Contrast => {
                let _ = write!(parameter, "Contrast: {}", settings.contrast);
            }
            Parameter::FineCal => {
                let _ = write!(parameter, "Fine cal: {}", settings.fine_cal);
            }
            Parameter::MediumCal => {
                let _ = write!(parameter, "Med cal: {}", settings.medium_cal);
            }
        }

        Screen {
            value,
            status,
            parameter,
            cursor,
            pending: self.edit_pending,
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Load persisted settings into the generator
pub fn restore_settings<const N: usize>(generator: &mut Generator<N>, settings: &Settings) {
    generator.set_waveform(settings.waveform);
    generator.set_duty(settings.duty);
    generator.set_amplitude(settings.amplitude);
    generator.set_mode(settings.mode);
    generator.set_calibration(settings.trim());
}

/// Recompute the output and remember a forced waveform change
pub fn recompute<const N: usize, P: OutputPort, B: SettingsBackend>(
    generator: &mut Generator<N>,
    port: &mut P,
    bank: &SampleBank<N>,
    store: &mut SettingsStore<B>,
) -> TimerPlan {
    let plan = generator.recompute(port, bank);
    if store.settings().waveform != plan.waveform {
        store.set_waveform(plan.waveform);
    }
    plan
}

fn step_percent(value: Percent, direction: Direction) -> Percent {
    match direction {
        Direction::Up => value.wrapping_up(),
        Direction::Down => value.wrapping_down(),
    }
}

fn step_contrast(value: u8, direction: Direction) -> u8 {
    match direction {
        Direction::Up if value >= MAX_CONTRAST => 0,
        Direction::Up => value + 1,
        Direction::Down if value == 0 => MAX_CONTRAST,
        Direction::Down => value.min(MAX_CONTRAST + 1) - 1,
    }
}

fn step_trim(value: i8, direction: Direction) -> i8 {
    match direction {
        Direction::Up => value.saturating_add(1),
        Direction::Down => value.saturating_sub(1),
    }
}
