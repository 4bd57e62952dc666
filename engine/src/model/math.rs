//! Small value math types carried through the graph.
//!
//! Components are `OrderedFloat` so values are `Eq`/`Hash` and job trees can
//! be compared structurally.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec2 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec3 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec4 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
    pub w: OrderedFloat<f64>,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
        }
    }
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
            w: OrderedFloat(w),
        }
    }
}

/// RGBA color in the reference (scene-linear) color space, 0.0..=1.0 nominal
/// but not clamped.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Color {
    pub r: OrderedFloat<f64>,
    pub g: OrderedFloat<f64>,
    pub b: OrderedFloat<f64>,
    pub a: OrderedFloat<f64>,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: OrderedFloat(r),
            g: OrderedFloat(g),
            b: OrderedFloat(b),
            a: OrderedFloat(a),
        }
    }

    pub fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::transparent()
    }
}

/// A 4x4 transformation matrix, column-major.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Mat4 {
    m: [OrderedFloat<f64>; 16],
}

impl Mat4 {
    pub fn identity() -> Self {
        let mut m = [OrderedFloat(0.0); 16];
        m[0] = OrderedFloat(1.0);
        m[5] = OrderedFloat(1.0);
        m[10] = OrderedFloat(1.0);
        m[15] = OrderedFloat(1.0);
        Mat4 { m }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        let mut out = Self::identity();
        out.m[12] = OrderedFloat(x);
        out.m[13] = OrderedFloat(y);
        out
    }

    pub fn scaling(x: f64, y: f64) -> Self {
        let mut out = Self::identity();
        out.m[0] = OrderedFloat(x);
        out.m[5] = OrderedFloat(y);
        out
    }

    /// Rotation about the Z axis, `degrees` counter-clockwise.
    pub fn rotation_z(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        let mut out = Self::identity();
        out.m[0] = OrderedFloat(cos);
        out.m[1] = OrderedFloat(sin);
        out.m[4] = OrderedFloat(-sin);
        out.m[5] = OrderedFloat(cos);
        out
    }

    pub fn at(&self, col: usize, row: usize) -> f64 {
        self.m[col * 4 + row].into_inner()
    }

    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let mut m = [OrderedFloat(0.0); 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(k, row) * rhs.at(col, k);
                }
                m[col * 4 + row] = OrderedFloat(sum);
            }
        }
        Mat4 { m }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_multiply() {
        let t = Mat4::translation(4.0, -2.0);
        assert_eq!(t.multiply(&Mat4::identity()), t);
        assert_eq!(Mat4::identity().multiply(&t), t);
    }

    #[test]
    fn test_translation_composition() {
        let a = Mat4::translation(1.0, 2.0);
        let b = Mat4::translation(3.0, 4.0);
        let c = a.multiply(&b);
        assert_eq!(c.at(3, 0), 4.0);
        assert_eq!(c.at(3, 1), 6.0);
    }
}
