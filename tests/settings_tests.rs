//! Settings Tests
//!
//! Tests for the settings block format, validation and the delayed commit.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test settings_tests

use siggen_firmware::config::STORE_COMMIT_DELAY_TICKS;
use siggen_firmware::platform::CalibrationSource;
use siggen_firmware::settings::{
    checksum, RamBackend, Settings, SettingsBackend, SettingsStore, StoreError, BLOCK_LEN,
};
use siggen_firmware::types::{CalibrationTrim, Percent, RequestMode, WaveformKind};

fn custom() -> Settings {
    Settings {
        fine_cal: -5,
        medium_cal: 3,
        contrast: 90,
        waveform: WaveformKind::Sine,
        duty: Percent::new(30).unwrap(),
        amplitude: Percent::new(75).unwrap(),
        mode: RequestMode::Frequency,
    }
}

fn stored(settings: &Settings) -> SettingsStore<RamBackend> {
    SettingsStore::open(RamBackend::with_block(settings.to_block()))
}

/// Tick until something is written, returning the number of ticks taken
fn ticks_to_commit<B: SettingsBackend>(store: &mut SettingsStore<B>) -> u32 {
    for tick in 1..=1_000 {
        if store.tick() == Ok(true) {
            return tick;
        }
    }
    panic!("nothing committed");
}

// =============================================================================
// Block Format Tests
// =============================================================================

#[test]
fn test_default_block_layout() {
    let block = Settings::default().to_block();
    assert_eq!(block, [0, 0, 64, 0, 0, 50, 100, 0, 0x80]);
}

#[test]
fn test_block_round_trip_with_negative_trim() {
    let block = custom().to_block();
    assert_eq!(block[0], 0xFB);
    assert_eq!(block[1], 3);
    assert_eq!(block[4], 2);
    assert_eq!(block[7], 1);
    assert_eq!(Settings::from_block(&block), Ok(custom()));
}

#[test]
fn test_checksum_is_seeded_sum() {
    let mut block = [0u8; BLOCK_LEN];
    assert_eq!(checksum(&block), 0xAA);
    block[0] = 0x56;
    assert_eq!(checksum(&block), 0x00);
    // The stored checksum byte is not part of the sum
    block[BLOCK_LEN - 1] = 0x12;
    assert_eq!(checksum(&block), 0x00);
}

#[test]
fn test_corrupted_byte_is_detected() {
    let mut block = custom().to_block();
    block[5] ^= 0x01;
    assert!(matches!(
        Settings::from_block(&block),
        Err(StoreError::Checksum { .. })
    ));
}

fn with_field(index: usize, value: u8) -> [u8; BLOCK_LEN] {
    let mut block = Settings::default().to_block();
    block[index] = value;
    block[BLOCK_LEN - 1] = checksum(&block);
    block
}

#[test]
fn test_out_of_range_fields_are_rejected() {
    assert_eq!(
        Settings::from_block(&with_field(2, 200)),
        Err(StoreError::Field("contrast"))
    );
    assert_eq!(
        Settings::from_block(&with_field(4, 3)),
        Err(StoreError::Field("waveform"))
    );
    assert_eq!(
        Settings::from_block(&with_field(5, 101)),
        Err(StoreError::Field("duty"))
    );
    assert_eq!(
        Settings::from_block(&with_field(6, 255)),
        Err(StoreError::Field("amplitude"))
    );
    assert_eq!(
        Settings::from_block(&with_field(7, 2)),
        Err(StoreError::Field("mode"))
    );
}

#[test]
fn test_reserved_byte_is_ignored() {
    assert_eq!(Settings::from_block(&with_field(3, 0x5A)), Ok(Settings::default()));
}

#[test]
fn test_error_messages() {
    let e = StoreError::Checksum {
        stored: 0xFF,
        computed: 0xA2,
    };
    assert_eq!(
        e.to_string(),
        "settings checksum mismatch (stored 0xff, computed 0xa2)"
    );
    assert_eq!(
        StoreError::Field("duty").to_string(),
        "settings field `duty` out of range"
    );
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_valid_block() {
    let store = stored(&custom());
    assert_eq!(store.settings(), &custom());
    assert_eq!(store.open_error(), None);
    assert!(!store.is_pending());
    assert_eq!(store.settings().trim(), CalibrationTrim::new(3, -5));
}

#[test]
fn test_open_erased_flash_restores_defaults() {
    let mut store = SettingsStore::open(RamBackend::erased());
    assert_eq!(
        store.open_error(),
        Some(StoreError::Checksum {
            stored: 0xFF,
            computed: 0xA2
        })
    );
    assert_eq!(store.settings(), &Settings::default());
    assert!(store.is_pending());

    // Defaults are written on the very next tick
    assert_eq!(store.tick(), Ok(true));
    assert_eq!(store.backend().writes(), 1);
    assert_eq!(store.backend().block(), &Settings::default().to_block());
    assert!(!store.is_pending());
}

// =============================================================================
// Commit Delay Tests
// =============================================================================

#[test]
fn test_change_commits_after_delay() {
    let mut store = stored(&Settings::default());
    store.set_duty(Percent::new(20).unwrap());
    assert!(store.is_pending());

    assert_eq!(ticks_to_commit(&mut store), u32::from(STORE_COMMIT_DELAY_TICKS));
    assert_eq!(store.backend().writes(), 1);
    assert_eq!(Settings::from_block(store.backend().block()).unwrap().duty.get(), 20);

    // Nothing more to do
    assert_eq!(store.tick(), Ok(false));
    assert_eq!(store.backend().writes(), 1);
}

#[test]
fn test_repeated_changes_restart_delay() {
    let mut store = stored(&Settings::default());
    store.set_contrast(70);
    for _ in 0..20 {
        assert_eq!(store.tick(), Ok(false));
    }
    store.set_contrast(71);
    assert_eq!(ticks_to_commit(&mut store), u32::from(STORE_COMMIT_DELAY_TICKS));
    assert_eq!(store.backend().writes(), 1);
    assert_eq!(store.backend().block()[2], 71);
}

#[test]
fn test_setters_update_values() {
    let mut store = stored(&Settings::default());
    store.set_fine_cal(-5);
    store.set_medium_cal(3);
    store.set_contrast(90);
    store.set_waveform(WaveformKind::Sine);
    store.set_duty(Percent::new(30).unwrap());
    store.set_amplitude(Percent::new(75).unwrap());
    store.set_mode(RequestMode::Frequency);
    assert_eq!(store.settings(), &custom());

    ticks_to_commit(&mut store);
    assert_eq!(store.backend().block(), &custom().to_block());
}

#[test]
fn test_contrast_is_clamped() {
    let mut store = stored(&Settings::default());
    store.set_contrast(200);
    assert_eq!(store.settings().contrast, 127);
}

#[test]
fn test_reset_commits_on_next_tick() {
    let mut store = stored(&custom());
    store.reset();
    assert_eq!(store.settings(), &Settings::default());
    assert_eq!(store.tick(), Ok(true));
    assert_eq!(store.backend().block(), &Settings::default().to_block());
}

#[test]
fn test_calibration_source() {
    let store = stored(&custom());
    assert_eq!(store.fine_cal(), -5);
    assert_eq!(store.medium_cal(), 3);
    assert_eq!(CalibrationSource::trim(&store), CalibrationTrim::new(3, -5));
}

// =============================================================================
// Backend Failure Tests
// =============================================================================

/// Backend that cannot be read and fails a number of writes
struct FlakyBackend {
    failures: u32,
    block: Option<[u8; BLOCK_LEN]>,
}

impl SettingsBackend for FlakyBackend {
    fn read(&mut self, _block: &mut [u8; BLOCK_LEN]) -> Result<(), StoreError> {
        Err(StoreError::Backend)
    }

    fn write(&mut self, block: &[u8; BLOCK_LEN]) -> Result<(), StoreError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(StoreError::Backend);
        }
        self.block = Some(*block);
        Ok(())
    }
}

#[test]
fn test_failed_write_is_retried() {
    let mut store = SettingsStore::open(FlakyBackend {
        failures: 1,
        block: None,
    });
    assert_eq!(store.open_error(), Some(StoreError::Backend));

    assert_eq!(store.tick(), Err(StoreError::Backend));
    assert!(store.is_pending());

    assert_eq!(ticks_to_commit(&mut store), u32::from(STORE_COMMIT_DELAY_TICKS));
    assert_eq!(store.backend().block, Some(Settings::default().to_block()));
}
