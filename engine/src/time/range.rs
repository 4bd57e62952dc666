//! Time ranges over the rational time base.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use super::Rational;

/// A half-open time interval `[start, end)`.
///
/// Construction normalizes the endpoints so `start <= end` always holds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TimeRange {
    start: Rational,
    end: Rational,
}

impl TimeRange {
    /// The whole representable timeline. Used for "everything changed"
    /// invalidations such as reconnections.
    pub const ALL: TimeRange = TimeRange {
        start: Rational::MIN,
        end: Rational::MAX,
    };

    pub fn new(start: Rational, end: Rational) -> Self {
        if end < start {
            TimeRange { start: end, end: start }
        } else {
            TimeRange { start, end }
        }
    }

    /// A zero-length range at a single time point.
    pub fn at(time: Rational) -> Self {
        TimeRange { start: time, end: time }
    }

    pub fn start(&self) -> Rational {
        self.start
    }

    pub fn end(&self) -> Rational {
        self.end
    }

    pub fn length(&self) -> Rational {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains_time(&self, time: Rational) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether the two ranges share any time. Zero-length ranges overlap a
    /// range that contains their time point.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersected(&self, other: &TimeRange) -> TimeRange {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end < start {
            TimeRange::at(start)
        } else {
            TimeRange { start, end }
        }
    }

    pub fn combined(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl Add<Rational> for TimeRange {
    type Output = TimeRange;

    fn add(self, rhs: Rational) -> TimeRange {
        TimeRange::new(self.start + rhs, self.end + rhs)
    }
}

impl Sub<Rational> for TimeRange {
    type Output = TimeRange;

    fn sub(self, rhs: Rational) -> TimeRange {
        TimeRange::new(self.start - rhs, self.end - rhs)
    }
}

/// An ordered set of non-overlapping time ranges.
///
/// Inserting coalesces overlapping and adjacent ranges, which is what makes
/// repeated identical invalidations idempotent: marking the same range dirty
/// twice leaves the list unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct TimeRangeList {
    ranges: Vec<TimeRange>,
}

impl TimeRangeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, range: TimeRange) {
        if range.is_empty() {
            return;
        }

        let mut merged = range;
        self.ranges.retain(|r| {
            if r.overlaps(&merged) {
                merged = merged.combined(r);
                false
            } else {
                true
            }
        });

        let pos = self
            .ranges
            .iter()
            .position(|r| r.start() > merged.start())
            .unwrap_or(self.ranges.len());
        self.ranges.insert(pos, merged);
    }

    /// Remove a range, splitting any entry that partially overlaps it.
    pub fn remove(&mut self, range: &TimeRange) {
        let mut result = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            if !r.overlaps(range) || range.is_empty() {
                result.push(r);
                continue;
            }
            if r.start() < range.start() {
                result.push(TimeRange::new(r.start(), range.start().min(r.end())));
            }
            if r.end() > range.end() {
                result.push(TimeRange::new(range.end().max(r.start()), r.end()));
            }
        }
        result.retain(|r| !r.is_empty());
        self.ranges = result;
    }

    pub fn contains(&self, range: &TimeRange) -> bool {
        self.ranges
            .iter()
            .any(|r| r.start() <= range.start() && r.end() >= range.end())
    }

    pub fn overlaps(&self, range: &TimeRange) -> bool {
        self.ranges
            .iter()
            .any(|r| r.overlaps(range) && !r.intersected(range).is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
