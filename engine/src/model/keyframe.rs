//! Keyframes and per-component keyframe tracks.
//!
//! A track holds the keys for one component of one input element (a `Vec2`
//! input has two tracks, a `Color` four). Keys are kept sorted by time;
//! sampling clamps outside the covered range and interpolates between the
//! bracketing pair inside it.

use serde::{Deserialize, Serialize};

use super::math::Vec2;
use super::value::ValueData;
use crate::time::{Rational, TimeRange};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeInterp {
    Hold,
    #[default]
    Linear,
    Bezier,
}

/// A time-stamped value on one track.
///
/// The bezier handles are offsets relative to the key's own (time, value)
/// position: `bezier_out` shapes the curve towards the next key, `bezier_in`
/// from the previous key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Keyframe {
    pub time: Rational,
    pub value: ValueData,
    #[serde(default)]
    pub interp: KeyframeInterp,
    #[serde(default)]
    pub bezier_in: Vec2,
    #[serde(default)]
    pub bezier_out: Vec2,
}

impl Keyframe {
    pub fn new(time: Rational, value: ValueData) -> Self {
        Self {
            time,
            value,
            interp: KeyframeInterp::Linear,
            bezier_in: Vec2::default(),
            bezier_out: Vec2::default(),
        }
    }

    pub fn with_interp(mut self, interp: KeyframeInterp) -> Self {
        self.interp = interp;
        self
    }

    /// Outgoing control handle with its time offset clamped into the span
    /// towards the next key, keeping the curve single-valued in time.
    fn valid_bezier_out(&self, span: f64) -> (f64, f64) {
        (
            self.bezier_out.x.into_inner().clamp(0.0, span),
            self.bezier_out.y.into_inner(),
        )
    }

    /// Incoming control handle, clamped into the span from the previous key.
    fn valid_bezier_in(&self, span: f64) -> (f64, f64) {
        (
            self.bezier_in.x.into_inner().clamp(-span, 0.0),
            self.bezier_in.y.into_inner(),
        )
    }
}

/// Keys for one component, totally ordered by time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct KeyframeTrack {
    keys: Vec<Keyframe>,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Insert a key, replacing any existing key at exactly the same time.
    pub fn insert(&mut self, key: Keyframe) {
        match self.keys.binary_search_by(|k| k.time.cmp(&key.time)) {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
    }

    pub fn remove_at(&mut self, time: Rational) -> Option<Keyframe> {
        match self.keys.binary_search_by(|k| k.time.cmp(&time)) {
            Ok(i) => Some(self.keys.remove(i)),
            Err(_) => None,
        }
    }

    pub fn key_at(&self, time: Rational) -> Option<&Keyframe> {
        self.keys
            .binary_search_by(|k| k.time.cmp(&time))
            .ok()
            .map(|i| &self.keys[i])
    }

    /// The time range whose sampled values depend on the key at `time`:
    /// from the previous key (or the beginning of time) to the next key (or
    /// the end of time). Used to compute invalidation ranges for key edits.
    pub fn range_around(&self, time: Rational) -> TimeRange {
        let mut start = Rational::MIN;
        let mut end = Rational::MAX;
        for key in &self.keys {
            if key.time < time {
                start = key.time;
            } else if key.time > time {
                end = key.time;
                break;
            }
        }
        TimeRange::new(start, end)
    }

    /// Sample the track at `time`. Returns `None` when the track has no keys
    /// (the caller falls back to the input's standard value).
    pub fn value_at(&self, time: Rational) -> Option<ValueData> {
        let first = self.keys.first()?;
        if time <= first.time {
            return Some(first.value.clone());
        }
        let last = self.keys.last()?;
        if time >= last.time {
            return Some(last.value.clone());
        }

        // Binary search for the bracketing pair: before.time <= time < after.time.
        let idx = match self.keys.binary_search_by(|k| k.time.cmp(&time)) {
            Ok(i) => return Some(self.keys[i].value.clone()),
            Err(i) => i - 1,
        };
        let before = &self.keys[idx];
        let after = &self.keys[idx + 1];

        Some(interpolate(before, after, time))
    }
}

fn interpolate(before: &Keyframe, after: &Keyframe, time: Rational) -> ValueData {
    let can_blend = matches!(
        (&before.value, &after.value),
        (ValueData::Float(_), ValueData::Float(_))
            | (ValueData::Rational(_), ValueData::Rational(_))
            | (ValueData::Integer(_), ValueData::Integer(_))
    );
    if !can_blend || before.interp == KeyframeInterp::Hold {
        return before.value.clone();
    }

    let t0 = before.time.to_f64();
    let t1 = after.time.to_f64();
    let v0 = scalar_of(&before.value);
    let v1 = scalar_of(&after.value);
    let x = time.to_f64();
    let span = t1 - t0;

    let interpolated = match (before.interp, after.interp) {
        (KeyframeInterp::Bezier, KeyframeInterp::Bezier) => {
            let out = before.valid_bezier_out(span);
            let inn = after.valid_bezier_in(span);
            cubic_x_to_y(
                x,
                (t0, v0),
                (t0 + out.0, v0 + out.1),
                (t1 + inn.0, v1 + inn.1),
                (t1, v1),
            )
        }
        (KeyframeInterp::Bezier, _) => {
            let out = before.valid_bezier_out(span);
            quadratic_x_to_y(x, (t0, v0), (t0 + out.0, v0 + out.1), (t1, v1))
        }
        (_, KeyframeInterp::Bezier) => {
            let inn = after.valid_bezier_in(span);
            quadratic_x_to_y(x, (t0, v0), (t1 + inn.0, v1 + inn.1), (t1, v1))
        }
        _ => {
            // Both linear.
            let progress = (x - t0) / span;
            v0 + (v1 - v0) * progress
        }
    };

    match &before.value {
        ValueData::Rational(_) => ValueData::Rational(Rational::from_f64(interpolated)),
        ValueData::Integer(_) => ValueData::Integer(interpolated.round() as i64),
        _ => ValueData::float(interpolated),
    }
}

fn scalar_of(value: &ValueData) -> f64 {
    match value {
        ValueData::Float(v) => v.into_inner(),
        ValueData::Integer(v) => *v as f64,
        ValueData::Rational(v) => v.to_f64(),
        _ => 0.0,
    }
}

fn bezier_point(t: f64, points: &[f64]) -> f64 {
    // De Casteljau over the given control values.
    let mut vals = points.to_vec();
    while vals.len() > 1 {
        for i in 0..vals.len() - 1 {
            vals[i] = vals[i] + (vals[i + 1] - vals[i]) * t;
        }
        vals.pop();
    }
    vals[0]
}

/// Evaluate a bezier whose control points are monotonic in x: solve for the
/// curve parameter at `x` by bisection, then evaluate y.
fn bezier_x_to_y(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let mut lo = 0.0;
    let mut hi = 1.0;
    for _ in 0..32 {
        let mid = (lo + hi) * 0.5;
        if bezier_point(mid, xs) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier_point((lo + hi) * 0.5, ys)
}

fn cubic_x_to_y(x: f64, p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> f64 {
    bezier_x_to_y(x, &[p0.0, p1.0, p2.0, p3.0], &[p0.1, p1.1, p2.1, p3.1])
}

fn quadratic_x_to_y(x: f64, p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    bezier_x_to_y(x, &[p0.0, p1.0, p2.0], &[p0.1, p1.1, p2.1])
}
