//! Types Module Tests
//!
//! Tests for domain types (WaveformKind, Request, Percent, UnitStep, etc.)
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test types_tests

use siggen_firmware::types::{
    freq_mhz_to_period_ns, period_ns_to_freq_mhz, CalibrationTrim, Percent, Request, RequestMode,
    UnitStep, WaveformKind,
};

// =============================================================================
// WaveformKind Tests
// =============================================================================

#[test]
fn test_waveform_cycle() {
    assert_eq!(WaveformKind::Square.next(), WaveformKind::Triangle);
    assert_eq!(WaveformKind::Sine.next(), WaveformKind::Square);
    assert_eq!(WaveformKind::Square.prev(), WaveformKind::Sine);
    for kind in WaveformKind::ALL {
        assert_eq!(kind.next().prev(), kind);
    }
}

#[test]
fn test_waveform_order_and_index() {
    assert!(WaveformKind::Square < WaveformKind::Triangle);
    assert!(WaveformKind::Triangle < WaveformKind::Sine);
    for kind in WaveformKind::ALL {
        assert_eq!(WaveformKind::from_index(kind.index()), Some(kind));
    }
    assert_eq!(WaveformKind::from_index(3), None);
}

#[test]
fn test_only_square_skips_the_table() {
    assert!(WaveformKind::Square.is_square());
    assert!(!WaveformKind::Triangle.is_square());
    assert!(!WaveformKind::Sine.is_square());
    assert_eq!(WaveformKind::Triangle.name(), "triangle");
}

// =============================================================================
// Request Tests
// =============================================================================

#[test]
fn test_request_accessors() {
    let request = Request::FrequencyMilliHz(1_000);
    assert_eq!(request.magnitude(), 1_000);
    assert_eq!(request.mode(), RequestMode::Frequency);
    assert_eq!(request.with_magnitude(7), Request::FrequencyMilliHz(7));
    assert_eq!(Request::PeriodNs(5).mode(), RequestMode::Period);
    assert_eq!(format!("{:?}", Request::PeriodNs(5)), "Request(5 ns)");
}

#[test]
fn test_request_mode_index() {
    assert_eq!(RequestMode::default(), RequestMode::Period);
    assert_eq!(RequestMode::from_index(RequestMode::Frequency.index()), Some(RequestMode::Frequency));
    assert_eq!(RequestMode::from_index(9), None);
}

#[test]
fn test_frequency_period_conversion() {
    assert_eq!(freq_mhz_to_period_ns(1_000_000), 1_000_000);
    assert_eq!(period_ns_to_freq_mhz(250), 4_000_000_000);
    // Below 0.25 Hz the period no longer fits
    assert_eq!(freq_mhz_to_period_ns(3), u32::MAX);
    // Rounds to nearest
    assert_eq!(freq_mhz_to_period_ns(3_000_000), 333_333);
    assert_eq!(freq_mhz_to_period_ns(1_500_000), 666_667);
    // Degenerate inputs saturate
    assert_eq!(freq_mhz_to_period_ns(0), u32::MAX);
    assert_eq!(period_ns_to_freq_mhz(0), u32::MAX);
}

// =============================================================================
// Percent Tests
// =============================================================================

#[test]
fn test_percent_range() {
    assert_eq!(Percent::new(100), Some(Percent::FULL));
    assert_eq!(Percent::new(101), None);
    assert_eq!(Percent::saturating(250), Percent::FULL);
    assert_eq!(Percent::HALF.get(), 50);
}

#[test]
fn test_percent_wraps() {
    assert_eq!(Percent::FULL.wrapping_up(), Percent::ZERO);
    assert_eq!(Percent::ZERO.wrapping_down(), Percent::FULL);
    assert_eq!(Percent::HALF.wrapping_up().get(), 51);
    assert_eq!(Percent::HALF.wrapping_down().get(), 49);
}

// =============================================================================
// Calibration and UnitStep Tests
// =============================================================================

#[test]
fn test_calibration_trim() {
    assert_eq!(CalibrationTrim::default(), CalibrationTrim::ZERO);
    let trim = CalibrationTrim::new(-2, 7);
    assert_eq!(trim.medium, -2);
    assert_eq!(trim.fine, 7);
}

#[test]
fn test_unit_step_range() {
    assert_eq!(UnitStep::new(3).map(UnitStep::index), Some(3));
    assert_eq!(UnitStep::new(4), None);
    assert_eq!(UnitStep::saturating(9).index(), UnitStep::MAX);
    assert_eq!(UnitStep::BASE.scale(), 1);
    assert_eq!(UnitStep::saturating(3).scale(), 1_000_000_000);
}

#[test]
fn test_unit_prefixes() {
    let prefixes: Vec<(char, char)> = (0..=UnitStep::MAX)
        .filter_map(UnitStep::new)
        .map(|s| (s.frequency_prefix(), s.period_prefix()))
        .collect();
    assert_eq!(
        prefixes,
        vec![('m', 'n'), (' ', 'u'), ('k', 'm'), ('M', ' ')]
    );
}
