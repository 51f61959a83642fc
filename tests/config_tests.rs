//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use siggen_firmware::config::*;
use siggen_firmware::platform::{TimerCapabilities, AVR_TIMER1, STM32G474_TIM3};
use siggen_firmware::settings::BLOCK_LEN;
use siggen_firmware::types::{freq_mhz_to_period_ns, Percent, WaveformKind};

// =============================================================================
// Clock and Timing Tests
// =============================================================================

#[test]
fn system_clock_valid() {
    // STM32G474 max clock is 170 MHz
    assert_eq!(SYSTEM_CLOCK_HZ, 170_000_000);
}

#[test]
fn ui_tick_is_20ms() {
    assert_eq!(UI_TICK_MS, 20);
    // Settle delay is about three seconds
    assert_eq!(u32::from(EDIT_SETTLE_TICKS) / UI_TICK_HZ, 3);
}

#[test]
fn timer_period_range() {
    assert_eq!(MIN_TIMER_PERIOD_NS, 250);
    assert_eq!(MAX_TIMER_PERIOD_NS, 4_000_000_000);
    // Frequency limits are the same range expressed in mHz
    assert_eq!(freq_mhz_to_period_ns(MAX_FREQUENCY_MHZ), MIN_TIMER_PERIOD_NS);
    assert_eq!(freq_mhz_to_period_ns(MIN_FREQUENCY_MHZ), MAX_TIMER_PERIOD_NS);
}

// =============================================================================
// Output Tests
// =============================================================================

#[test]
fn dac_scale_is_symmetric() {
    assert_eq!(DAC_MID_SCALE, 2048);
    assert_eq!(DAC_MID_SCALE + DAC_FULL_SCALE_AMPLITUDE, (1 << DAC_BITS) - 1);
    assert_eq!(DAC_MID_SCALE - DAC_FULL_SCALE_AMPLITUDE, 1);
}

#[test]
fn table_length_allows_quarter_symmetry() {
    assert_eq!(WAVEFORM_TABLE_LEN % 4, 0);
}

#[test]
fn defaults() {
    assert_eq!(DEFAULT_PERIOD_NS, 1_000_000);
    assert_eq!(DEFAULT_DUTY, Percent::HALF);
    assert_eq!(DEFAULT_AMPLITUDE, Percent::FULL);
    assert_eq!(DEFAULT_WAVEFORM, WaveformKind::Square);
    assert!(DEFAULT_CONTRAST <= MAX_CONTRAST);
}

// =============================================================================
// Timer Descriptor Tests
// =============================================================================

fn check_descriptor(caps: &TimerCapabilities) {
    assert!(!caps.prescalers.is_empty());
    assert!(caps
        .prescalers
        .windows(2)
        .all(|pair| pair[0].divisor < pair[1].divisor));
    assert_eq!(caps.oversample_ratio, WAVEFORM_TABLE_LEN as u32);
    assert_eq!(caps.max_ticks(), 65_536);
}

#[test]
fn descriptors_are_well_formed() {
    check_descriptor(&AVR_TIMER1);
    check_descriptor(&STM32G474_TIM3);
    assert_eq!(STM32G474_TIM3.clock_hz, SYSTEM_CLOCK_HZ);
}

#[test]
fn stm32_prescaler_bits_are_divisor_minus_one() {
    for p in STM32G474_TIM3.prescalers {
        assert_eq!(u32::from(p.bits), p.divisor - 1);
    }
}

#[test]
fn slowest_period_fits_the_counter() {
    // 4 s at the largest prescaler must not saturate the counter
    for caps in [AVR_TIMER1, STM32G474_TIM3] {
        let largest = caps.prescalers.last().unwrap().divisor;
        let ticks = u64::from(MAX_TIMER_PERIOD_NS) * u64::from(caps.clock_hz)
            / (1_000_000_000 * u64::from(largest));
        assert!(ticks <= caps.max_ticks(), "{} Hz", caps.clock_hz);
    }
}

// =============================================================================
// Flash Layout Tests
// =============================================================================

#[test]
fn settings_page_is_aligned() {
    assert_eq!(flash::SETTINGS_OFFSET % flash::PAGE_SIZE, 0);
    // Last page of 512 KiB
    assert_eq!(flash::SETTINGS_OFFSET + flash::PAGE_SIZE, 512 * 1024);
    assert!(BLOCK_LEN <= flash::PAGE_SIZE as usize);
}

#[test]
fn display_geometry() {
    assert_eq!(DISPLAY_WIDTH, 128);
    assert_eq!(DISPLAY_HEIGHT, 64);
    assert_eq!(DISPLAY_I2C_ADDR, 0x3C);
}
