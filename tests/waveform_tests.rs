//! Waveform Table Tests
//!
//! Tests for table synthesis, symmetry and amplitude scaling, and for the
//! double-buffered sample bank.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test waveform_tests

use siggen_firmware::config::{DAC_FULL_SCALE_AMPLITUDE, DAC_MID_SCALE};
use siggen_firmware::output::{SampleBank, WaveformShape, WaveformTable};
use siggen_firmware::types::{Percent, WaveformKind};

const MID: i32 = DAC_MID_SCALE;

fn build<const N: usize>(kind: WaveformKind, amplitude: u8) -> WaveformTable<N> {
    WaveformTable::build(kind, Percent::new(amplitude).unwrap(), WaveformShape::DAC)
}

fn offsets<const N: usize>(table: &WaveformTable<N>, count: usize) -> Vec<i32> {
    table.samples()[..count].iter().map(|s| s - MID).collect()
}

// =============================================================================
// Shape Tests
// =============================================================================

#[test]
fn test_dac_shape() {
    assert_eq!(WaveformShape::DAC.mid_scale, 2048);
    assert_eq!(WaveformShape::DAC.full_scale_amplitude, 2047);
    assert_eq!(DAC_FULL_SCALE_AMPLITUDE, 2047);
}

#[test]
fn test_square_table() {
    let table = build::<32>(WaveformKind::Square, 100);
    assert!(table.samples()[..16].iter().all(|&s| s == 4095));
    assert!(table.samples()[16..].iter().all(|&s| s == 1));
}

#[test]
fn test_sine_quarter_values() {
    let table = build::<32>(WaveformKind::Sine, 100);
    assert_eq!(
        offsets(&table, 8),
        vec![201, 594, 965, 1299, 1582, 1805, 1959, 2037]
    );
}

#[test]
fn test_triangle_ramp() {
    let table = build::<32>(WaveformKind::Triangle, 100);
    assert_eq!(
        offsets(&table, 9),
        vec![0, 256, 512, 768, 1024, 1279, 1535, 1791, 2047]
    );
    // Back down to mid-scale at half the cycle
    assert_eq!(table.samples()[15], MID + 256);
    assert_eq!(table.samples()[16], MID);
    assert_eq!(table.samples()[24], MID - 2047);
}

// =============================================================================
// Symmetry Properties
// =============================================================================

fn check_half_wave<const N: usize>(table: &WaveformTable<N>) {
    for i in 0..N / 2 {
        assert_eq!(table.samples()[i] + table.samples()[i + N / 2], 2 * MID, "index {i}");
    }
}

fn check_quadrants<const N: usize>(table: &WaveformTable<N>) {
    for i in 0..N / 4 {
        assert_eq!(table.samples()[i], table.samples()[N / 2 - 1 - i], "index {i}");
    }
}

#[test]
fn test_half_wave_symmetry_all_kinds() {
    for kind in WaveformKind::ALL {
        for amplitude in [0, 37, 50, 100] {
            check_half_wave(&build::<32>(kind, amplitude));
            check_half_wave(&build::<64>(kind, amplitude));
        }
    }
}

#[test]
fn test_quadrant_mirroring_square_and_sine() {
    for kind in [WaveformKind::Square, WaveformKind::Sine] {
        check_quadrants(&build::<32>(kind, 100));
        check_quadrants(&build::<16>(kind, 80));
    }
}

#[test]
fn test_computed_sine_stays_in_range() {
    let table = build::<64>(WaveformKind::Sine, 100);
    let peak = table.samples().iter().max().copied().unwrap();
    let trough = table.samples().iter().min().copied().unwrap();
    assert!(peak <= MID + DAC_FULL_SCALE_AMPLITUDE);
    assert!(peak > MID + 2000);
    assert_eq!(peak + trough, 2 * MID);
}

// =============================================================================
// Amplitude Tests
// =============================================================================

#[test]
fn test_zero_amplitude_is_flat() {
    for kind in WaveformKind::ALL {
        let table = build::<32>(kind, 0);
        assert_eq!(table, WaveformTable::flat(MID));
    }
}

#[test]
fn test_half_amplitude_truncates_toward_mid() {
    let full = build::<32>(WaveformKind::Sine, 100);
    let half = build::<32>(WaveformKind::Sine, 50);
    assert_eq!(full.samples()[7] - MID, 2037);
    assert_eq!(half.samples()[7] - MID, 1018);
    assert_eq!(half.samples()[23] - MID, -1018);
}

#[test]
fn test_custom_shape() {
    let shape = WaveformShape::new(128, 100);
    let table = WaveformTable::<8>::build(WaveformKind::Square, Percent::FULL, shape);
    assert_eq!(table.samples(), &[228, 228, 228, 228, 28, 28, 28, 28]);
}

#[test]
fn test_get_wraps() {
    let table = build::<32>(WaveformKind::Triangle, 100);
    assert_eq!(table.get(33), table.get(1));
    assert_eq!(table.len(), 32);
    assert!(!table.is_empty());
}

// =============================================================================
// Sample Bank Tests
// =============================================================================

#[test]
fn test_bank_starts_flat() {
    let bank = SampleBank::<32>::new(MID);
    for _ in 0..40 {
        assert_eq!(bank.next_sample(), MID);
    }
}

#[test]
fn test_stage_is_invisible_until_publish() {
    let bank = SampleBank::<32>::new(MID);
    let sine = build::<32>(WaveformKind::Sine, 100);

    bank.stage(&sine);
    assert_eq!(bank.active_table(), WaveformTable::flat(MID));
    assert_eq!(bank.next_sample(), MID);

    assert!(bank.publish());
    assert_eq!(bank.active_table(), sine);
    assert!(!bank.publish());
}

#[test]
fn test_playback_walks_the_table() {
    let bank = SampleBank::<32>::new(MID);
    let triangle = build::<32>(WaveformKind::Triangle, 100);
    bank.install(&triangle);

    let played: Vec<i32> = (0..32).map(|_| bank.next_sample()).collect();
    assert_eq!(played.as_slice(), triangle.samples());
    // Wraps around
    assert_eq!(bank.next_sample(), triangle.get(0));

    bank.next_sample();
    bank.rewind();
    assert_eq!(bank.next_sample(), triangle.get(0));
}
