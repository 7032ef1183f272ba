//! A wall-clock stopwatch with named laps that renders to JSON-shaped text.

pub mod format;
pub mod lap;
pub mod stopwatch;

pub use crate::format::{DurationFormatter, FormattingMode};
pub use crate::lap::{Lap, LapData};
pub use crate::stopwatch::Stopwatch;
