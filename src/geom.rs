// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device-space points and affine transform helpers.

use peniko::kurbo::Affine;

/// A point or vector in device (projected) space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// Normalize in place, returning the squared length before normalization.
    ///
    /// A zero vector stays zero and reports `None`.
    pub fn normalize(&mut self) -> Option<f32> {
        let d = self.x * self.x + self.y * self.y;
        if d > 0.0 {
            let inv = 1.0 / d.sqrt();
            self.x *= inv;
            self.y *= inv;
            Some(d)
        } else {
            None
        }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Point) -> Self {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Point) -> Self {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Extension methods on [`Affine`] used throughout the crate.
pub trait AffineExt {
    /// Inverse, falling back to identity when the matrix is singular.
    ///
    /// Degenerate transforms are absorbed rather than reported; drawing
    /// through a collapsed transform produces the untransformed result
    /// instead of NaNs.
    fn safe_inverse(&self) -> Affine;

    /// Project a point into device space, truncating to f32.
    fn project(&self, p: Point) -> Point;

    /// Apply only the linear part (no translation), for direction vectors.
    fn project_vec(&self, v: Point) -> Point;
}

impl AffineExt for Affine {
    fn safe_inverse(&self) -> Affine {
        if self.determinant().abs() < 1e-6 {
            Affine::IDENTITY
        } else {
            self.inverse()
        }
    }

    fn project(&self, p: Point) -> Point {
        let q = *self * peniko::kurbo::Point::new(p.x as f64, p.y as f64);
        Point::new(q.x as f32, q.y as f32)
    }

    fn project_vec(&self, v: Point) -> Point {
        let [a, b, c, d, _, _] = self.as_coeffs();
        Point::new(
            (a * v.x as f64 + c * v.y as f64) as f32,
            (b * v.x as f64 + d * v.y as f64) as f32,
        )
    }
}

/// Encode an affine in descriptor row order `[xx, xy, xt, yx, yy, yt]`.
///
/// This is the matrix layout the downstream evaluator multiplies screen
/// coordinates against; kurbo stores coefficients column-first.
pub(crate) fn encode_affine(m: Affine) -> [f32; 6] {
    let [a, b, c, d, e, f] = m.as_coeffs();
    [a as f32, c as f32, e as f32, b as f32, d as f32, f as f32]
}
