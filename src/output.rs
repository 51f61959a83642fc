//! Output Generation
//!
//! Turns the user's request into hardware state:
//! - [`solver`]: prescaler / period / compare registers for a frequency or period
//! - [`waveform`]: amplitude-scaled sample tables for triangle and sine
//! - [`bank`]: double-buffered table shared with the sample interrupt
//! - [`generator`]: the single-owner generator state driving the above

pub mod bank;
pub mod generator;
pub mod solver;
pub mod waveform;

pub use bank::SampleBank;
pub use generator::Generator;
pub use solver::{SolveRequest, TimerPlan, TimerSolver};
pub use waveform::{WaveformShape, WaveformTable};
