//! Engineering Notation Codec
//!
//! Renders an unsigned magnitude into exactly `W` characters with at most
//! three integer digits and a power-of-1000 [`UnitStep`].
//!
//! # Layout
//!
//! With `n` decimal digits the unit step is `(n - 1) / 3` and the integer
//! part keeps `(n - 1) % 3 + 1` digits. The field then holds `W - 1` digits
//! and a decimal point, except when the integer part alone fills the whole
//! field (only possible for `W == 3`, e.g. `"100"`). Surplus digits are
//! rounded half-up; missing digits are zero-filled.
//!
//! ```text
//!   magnitude      W=3       W=6
//!   1              "1.0"/0   "1.0000"/0
//!   100            "100"/0   "100.00"/0
//!   1_000          "1.0"/1   "1.0000"/1
//!   999_999        "1.0"/2   "1.0000"/2
//!   1_000_000_000  "1.0"/3   "1.0000"/3
//! ```
//!
//! The rendered text is derived from an explicit [`Decimal`]; digit edits
//! operate on its mantissa and never re-parse the text.

use core::fmt;

use heapless::String;

use crate::types::{Direction, UnitStep};

/// Character used to fill a field that cannot hold the value
pub const FILL: char = '-';

/// Widest field the codec renders
pub const MAX_WIDTH: usize = 20;

/// Most digits rounding may discard before the value counts as overflow
const MAX_EXCESS_DIGITS: u32 = 8;

const POW10: [u64; 20] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
];

/// Decimal value `mantissa × 10^exponent` in base units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decimal {
    /// Significant digits as shown on the display
    pub mantissa: u64,
    /// Power of ten of the mantissa's last digit
    pub exponent: i8,
}

impl Decimal {
    /// Create a decimal value
    #[must_use]
    pub const fn new(mantissa: u64, exponent: i8) -> Self {
        Self { mantissa, exponent }
    }

    /// Value in base units
    ///
    /// Fractional base units are dropped; the result saturates at
    /// `u32::MAX`.
    #[must_use]
    pub fn to_magnitude(self) -> u32 {
        let shift = usize::from(self.exponent.unsigned_abs());
        let value = if self.exponent >= 0 {
            match POW10.get(shift) {
                Some(&scale) => self.mantissa.saturating_mul(scale),
                None if self.mantissa == 0 => 0,
                None => u64::MAX,
            }
        } else {
            POW10.get(shift).map_or(0, |&scale| self.mantissa / scale)
        };
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Decimal {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}e{}", self.mantissa, self.exponent);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    decimal: Decimal,
    /// Digits shown
    digits: usize,
    /// Digits left of the point
    int_digits: usize,
}

/// A magnitude rendered into exactly `W` characters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedValue<const W: usize> {
    text: String<W>,
    unit_step: UnitStep,
    layout: Option<Layout>,
}

impl<const W: usize> FormattedValue<W> {
    fn overflow() -> Self {
        let mut text = String::new();
        for _ in 0..W {
            let _ = text.push(FILL);
        }
        Self {
            text,
            unit_step: UnitStep::BASE,
            layout: None,
        }
    }

    fn render(layout: Layout, unit_step: UnitStep) -> Self {
        let mut text = String::new();
        let point = layout.digits < W;
        for index in 0..layout.digits {
            if point && index == layout.int_digits {
                let _ = text.push('.');
            }
            let place = POW10[layout.digits - 1 - index];
            let digit = (layout.decimal.mantissa / place) % 10;
            // digit < 10
            #[allow(clippy::cast_possible_truncation)]
            let _ = text.push(char::from(b'0' + digit as u8));
        }
        if point && layout.int_digits == layout.digits {
            // Trailing point, e.g. "10."
            let _ = text.push('.');
        }
        Self {
            text,
            unit_step,
            layout: Some(layout),
        }
    }

    /// The rendered characters
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Power of 1000 the displayed number is scaled by
    #[must_use]
    pub const fn unit_step(&self) -> UnitStep {
        self.unit_step
    }

    /// The decimal value behind the text, None for the overflow fill
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        self.layout.map(|l| l.decimal)
    }

    /// True if the field holds the overflow fill
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        self.layout.is_none()
    }

    /// Decoded magnitude in base units (0 for the overflow fill)
    #[must_use]
    pub fn value(&self) -> u32 {
        self.decimal().map_or(0, Decimal::to_magnitude)
    }

    /// Number of digits shown
    #[must_use]
    pub fn digit_count(&self) -> usize {
        self.layout.map_or(0, |l| l.digits)
    }

    /// Column of the decimal point, if one is shown
    #[must_use]
    pub fn point_column(&self) -> Option<usize> {
        self.layout
            .filter(|l| l.digits < W)
            .map(|l| l.int_digits)
    }

    /// Column of the `index`-th digit from the left
    #[must_use]
    pub fn digit_column(&self, index: usize) -> Option<usize> {
        if index >= self.digit_count() {
            return None;
        }
        match self.point_column() {
            Some(point) if index >= point => Some(index + 1),
            _ => Some(index),
        }
    }

    /// Digit index shown at `column`, None for the point or outside the field
    #[must_use]
    pub fn digit_index_at(&self, column: usize) -> Option<usize> {
        let index = match self.point_column() {
            Some(point) if column == point => return None,
            Some(point) if column > point => column - 1,
            _ => column,
        };
        (index < self.digit_count()).then_some(index)
    }

    /// Power of ten represented by the `index`-th digit
    #[must_use]
    pub fn digit_weight(&self, index: usize) -> Option<i32> {
        let layout = self.layout?;
        if index >= layout.digits {
            return None;
        }
        let below = i32::try_from(layout.digits - 1 - index).ok()?;
        Some(i32::from(layout.decimal.exponent) + below)
    }
}

impl<const W: usize> fmt::Display for FormattedValue<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl<const W: usize> defmt::Format for FormattedValue<W> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "\"{}\"/{}", self.as_str(), self.unit_step.index());
    }
}

/// Number of decimal digits in `n` (1 for zero)
fn digit_count(n: u32) -> usize {
    let n = u64::from(n);
    POW10[1..].iter().take_while(|&&p| n >= p).count() + 1
}

/// Render `magnitude` into exactly `W` characters
///
/// Fields narrower than 3 characters cannot hold three integer digits and
/// always produce the overflow fill with unit step 0.
#[must_use]
pub fn encode<const W: usize>(magnitude: u32) -> FormattedValue<W> {
    if !(3..=MAX_WIDTH).contains(&W) {
        return FormattedValue::overflow();
    }

    let mut digits = digit_count(magnitude);
    loop {
        let step = (digits - 1) / 3;
        let int_digits = digits - 3 * step;
        let shown = if int_digits == W { W } else { W - 1 };

        let (mantissa, exponent) = if digits > shown {
            // digits <= 12, so the cast is lossless
            #[allow(clippy::cast_possible_truncation)]
            let excess = (digits - shown) as u32;
            if excess > MAX_EXCESS_DIGITS {
                return FormattedValue::overflow();
            }
            let divisor = POW10[excess as usize];
            let rounded = (u64::from(magnitude) + divisor / 2) / divisor;
            (rounded, excess as i8)
        } else {
            let pad = shown - digits;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let exponent = -(pad as i8);
            (u64::from(magnitude) * POW10[pad], exponent)
        };

        if mantissa >= POW10[shown] {
            // Rounding carried into a new leading digit
            digits += 1;
            continue;
        }

        let layout = Layout {
            decimal: Decimal::new(mantissa, exponent),
            digits: shown,
            int_digits,
        };
        #[allow(clippy::cast_possible_truncation)]
        let unit_step = UnitStep::saturating(step as u8);
        return FormattedValue::render(layout, unit_step);
    }
}

/// Step the digit at `column` up or down and return the new magnitude
///
/// The digit wraps 0↔9 without carrying into its neighbour. Digits the
/// rendering discarded stay zero, so the result is the smallest magnitude
/// that shows the edited digits. A column on the point, outside the field
/// or on the overflow fill leaves the value unchanged.
#[must_use]
pub fn decode_digit_edit<const W: usize>(
    rendered: &FormattedValue<W>,
    column: usize,
    direction: Direction,
) -> u32 {
    let Some(layout) = rendered.layout else {
        return 0;
    };
    let Some(index) = rendered.digit_index_at(column) else {
        return layout.decimal.to_magnitude();
    };

    let mantissa = layout.decimal.mantissa;
    let place = POW10[layout.digits - 1 - index];
    let old = (mantissa / place) % 10;
    let new = match direction {
        Direction::Up => (old + 1) % 10,
        Direction::Down => (old + 9) % 10,
    };
    let edited = mantissa - old * place + new * place;

    Decimal::new(edited, layout.decimal.exponent).to_magnitude()
}

/// Move the decimal point: multiply (`Up`) or divide (`Down`) by ten
///
/// The result is held within `floor..=ceiling`.
#[must_use]
pub fn decode_point_edit(magnitude: u32, direction: Direction, floor: u32, ceiling: u32) -> u32 {
    let shifted = match direction {
        Direction::Up => magnitude.saturating_mul(10),
        Direction::Down => magnitude / 10,
    };
    shifted.max(floor).min(ceiling)
}
