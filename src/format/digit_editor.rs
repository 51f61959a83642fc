//! Digit-by-digit value editing
//!
//! The editor keeps a cursor over the *stops* of a rendered value: every
//! digit worth at least one base unit, followed by the decimal point.
//! `up`/`down` on a digit wrap that digit; on the point they scale the
//! whole value by ten. Results are held within the editor's limits.

use crate::format::engineering::{decode_digit_edit, decode_point_edit, encode, FormattedValue};
use crate::types::Direction;

/// What the cursor is on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorPosition {
    /// The digit at this column of the rendered field
    Digit(usize),
    /// The decimal point (scale by ten)
    Point,
}

#[cfg(feature = "embedded")]
impl defmt::Format for CursorPosition {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Digit(column) => defmt::write!(f, "Digit({})", column),
            Self::Point => defmt::write!(f, "Point"),
        }
    }
}

/// Cursor and limits for editing a `W`-character field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitEditor<const W: usize> {
    stop: usize,
    floor: u32,
    ceiling: u32,
}

impl<const W: usize> DigitEditor<W> {
    /// Create an editor with the cursor on the leftmost digit
    #[must_use]
    pub const fn new(floor: u32, ceiling: u32) -> Self {
        Self {
            stop: 0,
            floor,
            ceiling,
        }
    }

    /// Smallest value an edit may produce
    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    /// Largest value an edit may produce
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Editable stops of `value`, left to right, ending with the point
    pub fn stops(value: &FormattedValue<W>) -> impl Iterator<Item = CursorPosition> + '_ {
        (0..value.digit_count())
            .filter(|&index| value.digit_weight(index).is_some_and(|w| w >= 0))
            .filter_map(|index| value.digit_column(index))
            .map(CursorPosition::Digit)
            .chain(core::iter::once(CursorPosition::Point))
    }

    fn stop_count(value: &FormattedValue<W>) -> usize {
        Self::stops(value).count()
    }

    /// Where the cursor is for the given rendered value
    ///
    /// If the value now has fewer stops than before the cursor lands on the
    /// point.
    #[must_use]
    pub fn position(&self, value: &FormattedValue<W>) -> CursorPosition {
        Self::stops(value)
            .nth(self.stop)
            .unwrap_or(CursorPosition::Point)
    }

    /// Column to highlight on the display
    #[must_use]
    pub fn column(&self, value: &FormattedValue<W>) -> Option<usize> {
        match self.position(value) {
            CursorPosition::Digit(column) => Some(column),
            CursorPosition::Point => value.point_column(),
        }
    }

    /// Move right; returns true when the cursor wrapped to the first stop
    pub fn next(&mut self, value: &FormattedValue<W>) -> bool {
        let count = Self::stop_count(value);
        if self.stop + 1 >= count {
            self.stop = 0;
            true
        } else {
            self.stop += 1;
            false
        }
    }

    /// Move left; returns true when the cursor wrapped to the last stop
    pub fn prev(&mut self, value: &FormattedValue<W>) -> bool {
        let last = Self::stop_count(value) - 1;
        let current = self.stop.min(last);
        if current == 0 {
            self.stop = last;
            true
        } else {
            self.stop = current - 1;
            false
        }
    }

    /// Put the cursor back on the leftmost digit
    pub fn reset(&mut self) {
        self.stop = 0;
    }

    /// Put the cursor on the point
    pub fn select_last(&mut self, value: &FormattedValue<W>) {
        self.stop = Self::stop_count(value) - 1;
    }

    /// Apply one edit to `magnitude` at the cursor
    #[must_use]
    pub fn apply(&self, magnitude: u32, direction: Direction) -> u32 {
        let rendered = encode::<W>(magnitude);
        let edited = match self.position(&rendered) {
            CursorPosition::Digit(column) => decode_digit_edit(&rendered, column, direction),
            CursorPosition::Point => {
                decode_point_edit(magnitude, direction, self.floor, self.ceiling)
            }
        };
        edited.max(self.floor).min(self.ceiling)
    }

    /// Apply an upward edit at the cursor
    #[must_use]
    pub fn up(&self, magnitude: u32) -> u32 {
        self.apply(magnitude, Direction::Up)
    }

    /// Apply a downward edit at the cursor
    #[must_use]
    pub fn down(&self, magnitude: u32) -> u32 {
        self.apply(magnitude, Direction::Down)
    }
}
