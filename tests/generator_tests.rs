//! Generator Tests
//!
//! Tests for the generator state: request bookkeeping, recompute, table
//! installation and the register writes handed to the output port.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test generator_tests

use critical_section::CriticalSection;

use siggen_firmware::config::{DAC_MID_SCALE, WAVEFORM_TABLE_LEN};
use siggen_firmware::output::{Generator, SampleBank, WaveformShape, WaveformTable};
use siggen_firmware::platform::{OutputPort, RegisterWrite, AVR_TIMER1};
use siggen_firmware::types::{
    freq_mhz_to_period_ns, CalibrationTrim, Percent, Request, RequestMode, WaveformKind,
};

const N: usize = WAVEFORM_TABLE_LEN;

/// Output port that remembers every write
#[derive(Default)]
struct RecordingPort {
    writes: Vec<RegisterWrite>,
}

impl RecordingPort {
    fn last(&self) -> RegisterWrite {
        *self.writes.last().expect("no register write")
    }
}

impl OutputPort for RecordingPort {
    fn apply(&mut self, _cs: CriticalSection<'_>, write: RegisterWrite) {
        self.writes.push(write);
    }
}

fn setup() -> (Generator<N>, RecordingPort, SampleBank<N>) {
    (
        Generator::new(AVR_TIMER1, CalibrationTrim::ZERO),
        RecordingPort::default(),
        SampleBank::new(DAC_MID_SCALE),
    )
}

// =============================================================================
// State Tests
// =============================================================================

#[test]
fn test_defaults() {
    let (generator, _, _) = setup();
    assert_eq!(generator.period_ns(), 1_000_000);
    assert_eq!(generator.frequency_mhz(), 1_000_000);
    assert_eq!(generator.mode(), RequestMode::Period);
    assert_eq!(generator.waveform(), WaveformKind::Square);
    assert_eq!(generator.duty(), Percent::HALF);
    assert_eq!(generator.amplitude(), Percent::FULL);
    assert!(!generator.is_on());
    assert!(generator.plan().is_none());
}

#[test]
fn test_frequency_and_period_follow_each_other() {
    let (mut generator, _, _) = setup();

    generator.set_frequency_mhz(1_234_567);
    assert_eq!(generator.mode(), RequestMode::Frequency);
    assert_eq!(generator.period_ns(), freq_mhz_to_period_ns(1_234_567));
    assert_eq!(generator.request().target, Request::FrequencyMilliHz(1_234_567));

    generator.set_period_ns(2_000_000);
    assert_eq!(generator.mode(), RequestMode::Period);
    assert_eq!(generator.frequency_mhz(), 500_000);
    assert_eq!(generator.request().target, Request::PeriodNs(2_000_000));
}

#[test]
fn test_set_mode_keeps_values() {
    let (mut generator, _, _) = setup();
    generator.set_mode(RequestMode::Frequency);
    assert_eq!(generator.request().target, Request::FrequencyMilliHz(1_000_000));
    assert_eq!(generator.period_ns(), 1_000_000);
}

// =============================================================================
// Recompute Tests
// =============================================================================

#[test]
fn test_recompute_programs_the_port() {
    let (mut generator, mut port, bank) = setup();
    let plan = generator.recompute(&mut port, &bank);

    assert_eq!(plan.ticks, 16_000);
    assert_eq!(generator.plan(), Some(&plan));
    assert_eq!(port.writes.len(), 1);
    assert_eq!(
        port.last(),
        RegisterWrite {
            prescaler_bits: 0b001,
            period_register: 15_999,
            compare_register: 7_999,
            square: true,
            enabled: false,
        }
    );

    generator.set_on(true);
    generator.recompute(&mut port, &bank);
    assert!(port.last().enabled);
    assert_eq!(port.writes.len(), 2);
}

#[test]
fn test_recompute_adopts_achieved_value() {
    let (mut generator, mut port, bank) = setup();
    generator.set_frequency_mhz(1_234_567);
    generator.recompute(&mut port, &bank);

    assert_eq!(generator.frequency_mhz(), 1_234_568);
    assert_eq!(generator.period_ns(), freq_mhz_to_period_ns(1_234_568));
    assert_eq!(generator.mode(), RequestMode::Frequency);
}

#[test]
fn test_recompute_clamps_into_range() {
    let (mut generator, mut port, bank) = setup();
    generator.set_period_ns(10);
    generator.recompute(&mut port, &bank);
    assert_eq!(generator.period_ns(), 250);
}

#[test]
fn test_calibration_changes_achieved_value() {
    let (mut generator, mut port, bank) = setup();
    generator.set_calibration(CalibrationTrim::new(1, 0));
    assert_eq!(generator.calibration(), CalibrationTrim::new(1, 0));

    generator.set_frequency_mhz(1_000_000);
    generator.recompute(&mut port, &bank);
    assert_eq!(generator.frequency_mhz(), 999_975);
}

#[test]
fn test_duty_reaches_compare_register() {
    let (mut generator, mut port, bank) = setup();
    generator.set_duty(Percent::new(25).unwrap());
    generator.recompute(&mut port, &bank);
    assert_eq!(port.last().compare_register, 3_999);
}

// =============================================================================
// Table Tests
// =============================================================================

#[test]
fn test_square_leaves_bank_alone() {
    let (mut generator, mut port, bank) = setup();
    generator.recompute(&mut port, &bank);
    assert_eq!(bank.active_table(), WaveformTable::flat(DAC_MID_SCALE));
}

#[test]
fn test_table_waveform_installs_table() {
    let (mut generator, mut port, bank) = setup();
    generator.set_waveform(WaveformKind::Sine);
    let plan = generator.recompute(&mut port, &bank);

    assert_eq!(plan.ticks, 500);
    assert!(!port.last().square);
    assert_eq!(
        bank.active_table(),
        WaveformTable::build(WaveformKind::Sine, Percent::FULL, WaveformShape::DAC)
    );
}

#[test]
fn test_amplitude_change_rebuilds_table() {
    let (mut generator, mut port, bank) = setup();
    generator.set_waveform(WaveformKind::Triangle);
    generator.recompute(&mut port, &bank);

    let half = Percent::new(50).unwrap();
    generator.set_amplitude(half);
    generator.recompute(&mut port, &bank);
    assert_eq!(
        bank.active_table(),
        WaveformTable::build(WaveformKind::Triangle, half, WaveformShape::DAC)
    );
    // Half amplitude peaks at mid + 1023
    assert_eq!(bank.active_table().get(8), DAC_MID_SCALE + 1_023);
}

#[test]
fn test_custom_shape_is_used() {
    let shape = WaveformShape::new(128, 100);
    let mut generator = Generator::<8>::new(AVR_TIMER1, CalibrationTrim::ZERO).with_shape(shape);
    let mut port = RecordingPort::default();
    let bank = SampleBank::<8>::new(128);

    generator.set_waveform(WaveformKind::Triangle);
    generator.recompute(&mut port, &bank);
    assert_eq!(bank.active_table().samples(), &[128, 178, 228, 178, 128, 78, 28, 78]);
}

#[test]
fn test_fast_table_request_falls_back_to_square() {
    let (mut generator, mut port, bank) = setup();
    generator.set_waveform(WaveformKind::Sine);
    generator.set_frequency_mhz(60_000_000);
    let plan = generator.recompute(&mut port, &bank);

    assert!(plan.forced_square);
    assert_eq!(generator.waveform(), WaveformKind::Square);
    assert!(port.last().square);
    assert_eq!(bank.active_table(), WaveformTable::flat(DAC_MID_SCALE));

    // Selecting a table waveform again at a playable rate rebuilds it
    generator.set_frequency_mhz(1_000_000);
    generator.set_waveform(WaveformKind::Sine);
    let plan = generator.recompute(&mut port, &bank);
    assert!(!plan.forced_square);
    assert_ne!(bank.active_table(), WaveformTable::flat(DAC_MID_SCALE));
}
