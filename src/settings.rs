//! Persistent Settings
//!
//! A small block of user settings protected by an additive checksum and
//! written back only after the user has stopped changing things for
//! [`STORE_COMMIT_DELAY_TICKS`] UI ticks, which keeps flash wear low while
//! a value is being scrolled.
//!
//! # Block layout
//!
//! ```text
//!   0 fine_cal   (i8)      4 waveform   5 duty %     8 checksum
//!   1 medium_cal (i8)      6 amplitude %
//!   2 contrast             7 request mode
//!   3 reserved
//! ```
//!
//! The checksum is `0xAA` plus the wrapping sum of bytes 0..8.

use crate::config::{
    DEFAULT_AMPLITUDE, DEFAULT_CONTRAST, DEFAULT_DUTY, DEFAULT_WAVEFORM, MAX_CONTRAST,
    STORE_COMMIT_DELAY_TICKS,
};
use crate::platform::CalibrationSource;
use crate::types::{CalibrationTrim, Percent, RequestMode, WaveformKind};

/// Size of the stored block including the checksum
pub const BLOCK_LEN: usize = 9;

/// Seed of the additive checksum
const CHECKSUM_SEED: u8 = 0xAA;

/// Settings persistence errors
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Stored block does not match its checksum
    #[error("settings checksum mismatch (stored {stored:#04x}, computed {computed:#04x})")]
    Checksum {
        /// Checksum byte read back
        stored: u8,
        /// Checksum of the data bytes
        computed: u8,
    },
    /// A field holds a value outside its range
    #[error("settings field `{0}` out of range")]
    Field(&'static str),
    /// The storage backend failed
    #[error("settings storage access failed")]
    Backend,
}

#[cfg(feature = "embedded")]
impl defmt::Format for StoreError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Checksum { stored, computed } => {
                defmt::write!(f, "Checksum(stored={=u8:#x}, computed={=u8:#x})", stored, computed);
            }
            Self::Field(name) => defmt::write!(f, "Field({=str})", name),
            Self::Backend => defmt::write!(f, "Backend"),
        }
    }
}

/// Storage for one settings block
pub trait SettingsBackend {
    /// Read the stored block
    ///
    /// # Errors
    /// [`StoreError::Backend`] if the storage cannot be read.
    fn read(&mut self, block: &mut [u8; BLOCK_LEN]) -> Result<(), StoreError>;

    /// Replace the stored block
    ///
    /// # Errors
    /// [`StoreError::Backend`] if the storage cannot be written.
    fn write(&mut self, block: &[u8; BLOCK_LEN]) -> Result<(), StoreError>;
}

/// Block held in RAM; used on the host and when no flash is available
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RamBackend {
    block: [u8; BLOCK_LEN],
    writes: u32,
}

impl RamBackend {
    /// Erased storage (all ones)
    #[must_use]
    pub const fn erased() -> Self {
        Self::with_block([0xFF; BLOCK_LEN])
    }

    /// Storage preloaded with `block`
    #[must_use]
    pub const fn with_block(block: [u8; BLOCK_LEN]) -> Self {
        Self { block, writes: 0 }
    }

    /// Current contents
    #[must_use]
    pub const fn block(&self) -> &[u8; BLOCK_LEN] {
        &self.block
    }

    /// Number of writes so far
    #[must_use]
    pub const fn writes(&self) -> u32 {
        self.writes
    }
}

impl SettingsBackend for RamBackend {
    fn read(&mut self, block: &mut [u8; BLOCK_LEN]) -> Result<(), StoreError> {
        *block = self.block;
        Ok(())
    }

    fn write(&mut self, block: &[u8; BLOCK_LEN]) -> Result<(), StoreError> {
        self.block = *block;
        self.writes += 1;
        Ok(())
    }
}

/// The persisted values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Fine clock trim
    pub fine_cal: i8,
    /// Medium clock trim
    pub medium_cal: i8,
    /// Display contrast (0..=127)
    pub contrast: u8,
    /// Last selected waveform
    pub waveform: WaveformKind,
    /// Square duty cycle
    pub duty: Percent,
    /// Table amplitude
    pub amplitude: Percent,
    /// Last edited quantity
    pub mode: RequestMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fine_cal: 0,
            medium_cal: 0,
            contrast: DEFAULT_CONTRAST,
            waveform: DEFAULT_WAVEFORM,
            duty: DEFAULT_DUTY,
            amplitude: DEFAULT_AMPLITUDE,
            mode: RequestMode::Period,
        }
    }
}

impl Settings {
    /// Serialize, checksum included
    #[must_use]
    pub fn to_block(&self) -> [u8; BLOCK_LEN] {
        let mut block = [
            self.fine_cal.to_le_bytes()[0],
            self.medium_cal.to_le_bytes()[0],
            self.contrast,
            0,
            self.waveform.index(),
            self.duty.get(),
            self.amplitude.get(),
            self.mode.index(),
            0,
        ];
        block[BLOCK_LEN - 1] = checksum(&block);
        block
    }

    /// Parse and validate a stored block
    ///
    /// # Errors
    /// [`StoreError::Checksum`] if the checksum does not match,
    /// [`StoreError::Field`] if a field is out of range.
    pub fn from_block(block: &[u8; BLOCK_LEN]) -> Result<Self, StoreError> {
        let computed = checksum(block);
        let stored = block[BLOCK_LEN - 1];
        if stored != computed {
            return Err(StoreError::Checksum { stored, computed });
        }

        let contrast = block[2];
        if contrast > MAX_CONTRAST {
            return Err(StoreError::Field("contrast"));
        }
        Ok(Self {
            fine_cal: i8::from_le_bytes([block[0]]),
            medium_cal: i8::from_le_bytes([block[1]]),
            contrast,
            waveform: WaveformKind::from_index(block[4]).ok_or(StoreError::Field("waveform"))?,
            duty: Percent::new(block[5]).ok_or(StoreError::Field("duty"))?,
            amplitude: Percent::new(block[6]).ok_or(StoreError::Field("amplitude"))?,
            mode: RequestMode::from_index(block[7]).ok_or(StoreError::Field("mode"))?,
        })
    }

    /// Calibration pair
    #[must_use]
    pub const fn trim(&self) -> CalibrationTrim {
        CalibrationTrim::new(self.medium_cal, self.fine_cal)
    }
}

/// Checksum over every byte but the last
#[must_use]
pub fn checksum(block: &[u8; BLOCK_LEN]) -> u8 {
    block[..BLOCK_LEN - 1]
        .iter()
        .fold(CHECKSUM_SEED, |sum, &b| sum.wrapping_add(b))
}

/// Settings with delayed write-back
pub struct SettingsStore<B: SettingsBackend> {
    backend: B,
    settings: Settings,
    wait: u8,
    open_error: Option<StoreError>,
}

impl<B: SettingsBackend> SettingsStore<B> {
    /// Load settings from `backend`
    ///
    /// An unreadable or corrupt block is replaced by defaults, which are
    /// written back on the next tick. The reason is kept in
    /// [`open_error`](Self::open_error).
    pub fn open(mut backend: B) -> Self {
        let mut block = [0; BLOCK_LEN];
        let loaded = backend
            .read(&mut block)
            .and_then(|()| Settings::from_block(&block));

        let mut store = Self {
            backend,
            settings: Settings::default(),
            wait: 0,
            open_error: None,
        };
        match loaded {
            Ok(settings) => {
                info!("settings loaded: trim {}/{}", settings.medium_cal, settings.fine_cal);
                store.settings = settings;
            }
            Err(e) => {
                warn!("settings invalid ({}), using defaults", e);
                store.open_error = Some(e);
                store.reset();
            }
        }
        store
    }

    /// Why the stored block was rejected at open, if it was
    #[must_use]
    pub const fn open_error(&self) -> Option<StoreError> {
        self.open_error
    }

    /// Current values
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The storage backend
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// True while a write is scheduled
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.wait > 0
    }

    /// Restore defaults and write them on the next tick
    pub fn reset(&mut self) {
        self.settings = Settings::default();
        self.wait = 1;
    }

    /// Advance the commit delay by one UI tick
    ///
    /// Returns true when the block was written on this tick.
    ///
    /// # Errors
    /// [`StoreError::Backend`] if the write failed; it is retried after
    /// another full delay.
    pub fn tick(&mut self) -> Result<bool, StoreError> {
        if self.wait == 0 {
            return Ok(false);
        }
        self.wait -= 1;
        if self.wait > 0 {
            return Ok(false);
        }
        let block = self.settings.to_block();
        if let Err(e) = self.backend.write(&block) {
            self.wait = STORE_COMMIT_DELAY_TICKS;
            return Err(e);
        }
        debug!("settings committed");
        Ok(true)
    }

    fn touch(&mut self) {
        self.wait = STORE_COMMIT_DELAY_TICKS;
    }

    /// Set the fine trim
    pub fn set_fine_cal(&mut self, value: i8) {
        self.settings.fine_cal = value;
        self.touch();
    }

    /// Set the medium trim
    pub fn set_medium_cal(&mut self, value: i8) {
        self.settings.medium_cal = value;
        self.touch();
    }

    /// Set the display contrast, clamped to the panel's range
    pub fn set_contrast(&mut self, value: u8) {
        self.settings.contrast = value.min(MAX_CONTRAST);
        self.touch();
    }

    /// Remember the waveform
    pub fn set_waveform(&mut self, value: WaveformKind) {
        self.settings.waveform = value;
        self.touch();
    }

    /// Remember the duty cycle
    pub fn set_duty(&mut self, value: Percent) {
        self.settings.duty = value;
        self.touch();
    }

    /// Remember the amplitude
    pub fn set_amplitude(&mut self, value: Percent) {
        self.settings.amplitude = value;
        self.touch();
    }

    /// Remember the request mode
    pub fn set_mode(&mut self, value: RequestMode) {
        self.settings.mode = value;
        self.touch();
    }
}

impl<B: SettingsBackend> CalibrationSource for SettingsStore<B> {
    fn fine_cal(&self) -> i8 {
        self.settings.fine_cal
    }

    fn medium_cal(&self) -> i8 {
        self.settings.medium_cal
    }
}
