//! Engineering-Notation Formatting
//!
//! Fixed-width rendering of unsigned magnitudes for the small display:
//! - [`engineering`]: encode a magnitude into at most three integer digits
//!   plus a power-of-1000 unit step, and decode single-digit edits
//! - [`digit_editor`]: cursor over the editable columns of a rendered value

pub mod digit_editor;
pub mod engineering;

pub use digit_editor::{CursorPosition, DigitEditor};
pub use engineering::{decode_digit_edit, decode_point_edit, encode, Decimal, FormattedValue};
