//! OLED Display Driver
//!
//! SSD1306 128x64 on I2C1 and the renderer that turns a [`Screen`] into
//! pixels.
//!
//! Every bus transfer starts with a control byte: `0x00` for a run of
//! commands, `0x40` for display RAM. The panel is driven in horizontal
//! addressing mode, so a full refresh is one window command followed by
//! one data transfer per 8-pixel page.

use embassy_stm32::i2c::{Error as I2cError, I2c};
use embassy_stm32::mode::Async;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::config::{DISPLAY_HEIGHT, DISPLAY_I2C_ADDR, DISPLAY_WIDTH};
use crate::ui::{Screen, ScreenLine};

/// Display bus result
pub type DisplayResult<T> = Result<T, I2cError>;

const WIDTH: usize = DISPLAY_WIDTH as usize;
const PAGES: usize = DISPLAY_HEIGHT as usize / 8;

const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

/// SSD1306 commands
mod cmd {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MULTIPLEX: u8 = 0xA8;
    pub const SET_START_LINE: u8 = 0x40;
    pub const MEMORY_MODE: u8 = 0x20;
    pub const COLUMN_ADDR: u8 = 0x21;
    pub const PAGE_ADDR: u8 = 0x22;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SEG_REMAP: u8 = 0xA0;
    pub const CHARGE_PUMP: u8 = 0x8D;
}

/// Power-up configuration; contrast is sent separately
const INIT_SEQUENCE: [u8; 22] = [
    cmd::DISPLAY_OFF,
    cmd::SET_DISPLAY_CLOCK_DIV,
    0x80,
    cmd::SET_MULTIPLEX,
    0x3F, // 64 rows
    cmd::SET_DISPLAY_OFFSET,
    0x00,
    cmd::SET_START_LINE,
    cmd::CHARGE_PUMP,
    0x14,
    cmd::MEMORY_MODE,
    0x00, // Horizontal addressing
    cmd::SEG_REMAP | 0x01,
    cmd::COM_SCAN_DEC,
    cmd::SET_COM_PINS,
    0x12,
    cmd::SET_PRECHARGE,
    0xF1,
    cmd::SET_VCOM_DETECT,
    0x40,
    cmd::DISPLAY_ALL_ON_RESUME,
    cmd::NORMAL_DISPLAY,
];

/// Whole-panel RAM window
const FULL_WINDOW: [u8; 6] = [
    cmd::COLUMN_ADDR,
    0,
    (WIDTH - 1) as u8,
    cmd::PAGE_ADDR,
    0,
    (PAGES - 1) as u8,
];

/// 1 bpp image in controller layout: one byte is a column of 8 rows
pub struct Framebuffer {
    pages: [[u8; WIDTH]; PAGES],
}

impl Framebuffer {
    /// Create a blank framebuffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pages: [[0; WIDTH]; PAGES],
        }
    }

    /// Blank every pixel
    pub fn clear(&mut self) {
        for page in &mut self.pages {
            page.fill(0);
        }
    }

    fn set(&mut self, x: usize, y: usize, on: bool) {
        let Some(byte) = self.pages.get_mut(y / 8).and_then(|page| page.get_mut(x)) else {
            return;
        };
        let mask = 1 << (y % 8);
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) {
                self.set(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

/// SSD1306 panel
pub struct Display<'d> {
    i2c: I2c<'d, Async>,
    frame: Framebuffer,
}

impl<'d> Display<'d> {
    /// Create a driver on an initialized bus
    #[must_use]
    pub fn new(i2c: I2c<'d, Async>) -> Self {
        Self {
            i2c,
            frame: Framebuffer::new(),
        }
    }

    /// Configure the controller, blank the panel and switch it on
    pub async fn init(&mut self, contrast: u8) -> DisplayResult<()> {
        self.commands(&INIT_SEQUENCE).await?;
        self.set_contrast(contrast).await?;
        self.frame.clear();
        self.flush().await?;
        self.commands(&[cmd::DISPLAY_ON]).await
    }

    /// Send a run of command bytes in one transfer
    async fn commands(&mut self, bytes: &[u8]) -> DisplayResult<()> {
        let mut buf = [0u8; INIT_SEQUENCE.len() + 1];
        let len = bytes.len().min(INIT_SEQUENCE.len());
        buf[0] = CONTROL_COMMAND;
        buf[1..=len].copy_from_slice(&bytes[..len]);
        self.i2c.write(DISPLAY_I2C_ADDR, &buf[..=len]).await
    }

    /// Send the framebuffer to display RAM
    pub async fn flush(&mut self) -> DisplayResult<()> {
        self.commands(&FULL_WINDOW).await?;

        let mut buf = [0u8; WIDTH + 1];
        buf[0] = CONTROL_DATA;
        for page in 0..PAGES {
            buf[1..].copy_from_slice(&self.frame.pages[page]);
            self.i2c.write(DISPLAY_I2C_ADDR, &buf).await?;
        }
        Ok(())
    }

    /// Draw `screen` and send it to the panel
    pub async fn show(&mut self, screen: &Screen) -> DisplayResult<()> {
        ScreenRenderer::render(&mut self.frame, screen);
        self.flush().await
    }

    /// Set display contrast
    pub async fn set_contrast(&mut self, contrast: u8) -> DisplayResult<()> {
        self.commands(&[cmd::SET_CONTRAST, contrast]).await
    }
}

/// Layout of the generator screen
///
/// ```text
///   status line     (6x10)   y = 0
///   value line      (10x20)  y = 16
///   parameter line  (6x10)   y = 52
/// ```
pub struct ScreenRenderer;

impl ScreenRenderer {
    const STATUS_Y: i32 = 0;
    const VALUE_Y: i32 = 16;
    const PARAMETER_Y: i32 = 52;

    /// Marker shown at the right of the status line while an edit settles
    const PENDING_X: i32 = 120;

    /// Draw the whole screen
    pub fn render(frame: &mut Framebuffer, screen: &Screen) {
        frame.clear();

        Self::text(frame, &screen.status, 0, Self::STATUS_Y, &FONT_6X10);
        if screen.pending {
            Self::text(frame, "*", Self::PENDING_X, Self::STATUS_Y, &FONT_6X10);
        }
        Self::text(frame, &screen.value, 0, Self::VALUE_Y, &FONT_10X20);
        Self::text(frame, &screen.parameter, 0, Self::PARAMETER_Y, &FONT_6X10);

        if let Some(cursor) = screen.cursor {
            let (y, font) = match cursor.line {
                ScreenLine::Value => (Self::VALUE_Y, &FONT_10X20),
                ScreenLine::Parameter => (Self::PARAMETER_Y, &FONT_6X10),
            };
            Self::underline(frame, cursor.column, y, font);
        }
    }

    fn text(frame: &mut Framebuffer, text: &str, x: i32, y: i32, font: &MonoFont<'_>) {
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(frame);
    }

    /// Two-pixel bar under character `column` of the line at `y`
    fn underline(frame: &mut Framebuffer, column: usize, y: i32, font: &MonoFont<'_>) {
        let pitch = font.character_size.width + font.character_spacing;
        let x = u32::try_from(column)
            .ok()
            .and_then(|c| c.checked_mul(pitch))
            .and_then(|x| i32::try_from(x).ok())
            .unwrap_or(0);
        let top = y + i32::try_from(font.character_size.height).unwrap_or(0);
        let _ = Rectangle::new(Point::new(x, top), Size::new(font.character_size.width, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(frame);
    }
}
