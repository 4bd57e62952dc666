//! Rational time base and time ranges.

mod range;
mod rational;

pub use range::{TimeRange, TimeRangeList};
pub use rational::Rational;
