//! Flash-backed settings
//!
//! The settings block lives at the start of the last flash page. A write
//! erases the page and programs the block padded to whole double words.

use embassy_stm32::flash::{Blocking, Flash};

use crate::config::flash::{PAGE_SIZE, SETTINGS_OFFSET, WRITE_SIZE};
use crate::settings::{SettingsBackend, StoreError, BLOCK_LEN};

/// Block length rounded up to the programming granularity
const PADDED_LEN: usize = BLOCK_LEN.div_ceil(WRITE_SIZE) * WRITE_SIZE;

/// Settings page in internal flash
pub struct FlashBackend<'d> {
    flash: Flash<'d, Blocking>,
}

impl<'d> FlashBackend<'d> {
    /// Use `flash` for settings storage
    #[must_use]
    pub fn new(flash: Flash<'d, Blocking>) -> Self {
        Self { flash }
    }
}

impl SettingsBackend for FlashBackend<'_> {
    fn read(&mut self, block: &mut [u8; BLOCK_LEN]) -> Result<(), StoreError> {
        self.flash
            .blocking_read(SETTINGS_OFFSET, block)
            .map_err(|e| {
                warn!("flash read failed: {}", e);
                StoreError::Backend
            })
    }

    fn write(&mut self, block: &[u8; BLOCK_LEN]) -> Result<(), StoreError> {
        let mut padded = [0xFF; PADDED_LEN];
        padded[..BLOCK_LEN].copy_from_slice(block);

        self.flash
            .blocking_erase(SETTINGS_OFFSET, SETTINGS_OFFSET + PAGE_SIZE)
            .and_then(|()| self.flash.blocking_write(SETTINGS_OFFSET, &padded))
            .map_err(|e| {
                warn!("flash write failed: {}", e);
                StoreError::Backend
            })
    }
}
