//! Exact rational numbers for the time base.
//!
//! Frame rates like 30000/1001 cannot be represented exactly as floats, and
//! accumulated float error drifts over long timelines. All time points and
//! range endpoints in the engine are therefore rationals; conversion to `f64`
//! happens only at the edge (keyframe interpolation math).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A rational number `num / den`, always normalized: the sign lives in the
/// numerator, the denominator is positive, and the fraction is fully reduced.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };

    /// Smallest representable time point. Used for "all of time" ranges.
    pub const MIN: Rational = Rational { num: i64::MIN, den: 1 };

    /// Largest representable time point.
    pub const MAX: Rational = Rational { num: i64::MAX, den: 1 };

    pub fn new(num: i64, den: i64) -> Self {
        Self::from_i128(num as i128, den as i128)
    }

    pub fn from_int(value: i64) -> Self {
        Rational { num: value, den: 1 }
    }

    /// Build from intermediate 128-bit math, reducing and saturating back to
    /// the 64-bit representation.
    fn from_i128(mut num: i128, mut den: i128) -> Self {
        if den == 0 {
            // A zero denominator has no meaning; treat as zero like the
            // surrounding arithmetic would for an empty duration.
            return Self::ZERO;
        }
        if den < 0 {
            num = -num;
            den = -den;
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs());
        if g > 1 {
            num /= g as i128;
            den /= g as i128;
        }
        Rational {
            num: num.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            den: den.clamp(1, i64::MAX as i128) as i64,
        }
    }

    /// Approximate a float as a rational with a bounded denominator.
    /// Only used when interpolation produces a fractional rational value.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return if value > 0.0 { Self::MAX } else { Self::MIN };
        }
        const BASE: i64 = 1_000_000_000;
        if value.abs() >= (i64::MAX / BASE) as f64 {
            return if value > 0.0 { Self::MAX } else { Self::MIN };
        }
        Self::new((value * BASE as f64).round() as i64, BASE)
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn abs(&self) -> Self {
        Rational {
            num: self.num.saturating_abs(),
            den: self.den,
        }
    }

    /// Reciprocal. Zero flips to zero.
    pub fn flipped(&self) -> Self {
        Self::from_i128(self.den as i128, self.num as i128)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational::from_i128(
            self.num as i128 * rhs.den as i128 + rhs.num as i128 * self.den as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        self + (-rhs)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational::from_i128(
            self.num as i128 * rhs.num as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: self.num.checked_neg().unwrap_or(i64::MAX),
            den: self.den,
        }
    }
}

impl AddAssign for Rational {
    fn add_assign(&mut self, rhs: Rational) {
        *self = *self + rhs;
    }
}

impl SubAssign for Rational {
    fn sub_assign(&mut self, rhs: Rational) {
        *self = *self - rhs;
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are always positive, so cross-multiplication preserves
        // ordering. 128-bit to avoid overflow at the MIN/MAX sentinels.
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(Rational::new(2, 4), Rational::new(1, 2));
        assert_eq!(Rational::new(-2, -4), Rational::new(1, 2));
        assert_eq!(Rational::new(2, -4), Rational::new(-1, 2));
        assert_eq!(Rational::new(0, 5), Rational::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let half = Rational::new(1, 2);
        let third = Rational::new(1, 3);
        assert_eq!(half + third, Rational::new(5, 6));
        assert_eq!(half - third, Rational::new(1, 6));
        assert_eq!(half * third, Rational::new(1, 6));
        assert_eq!(-half, Rational::new(-1, 2));
    }

    #[test]
    fn test_ordering() {
        assert!(Rational::new(1, 3) < Rational::new(1, 2));
        assert!(Rational::MIN < Rational::new(-1000, 1));
        assert!(Rational::MAX > Rational::new(1000, 1));
        assert!(Rational::MIN < Rational::MAX);
    }

    #[test]
    fn test_ntsc_frame_rate_is_exact() {
        let fps = Rational::new(30000, 1001);
        let frame = fps.flipped();
        let mut t = Rational::ZERO;
        for _ in 0..30000 {
            t += frame;
        }
        assert_eq!(t, Rational::from_int(1001));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Rational::from_f64(0.5), Rational::new(1, 2));
        assert_eq!(Rational::from_f64(-2.0), Rational::from_int(-2));
    }
}
