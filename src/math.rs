//! Core 2D vector/rotation types shared by every other module.

use ultraviolet::DVec2;

/// A displacement or velocity. Distinct name from [`Point`] for readability at call sites;
/// both are the same underlying representation.
pub type Vector = DVec2;
/// A position in world or body-local space.
pub type Point = DVec2;

/// 2D cross product (scalar): `a.x*b.y - a.y*b.x`.
pub fn cross(a: Vector, b: Vector) -> f64 {
    a.x * b.y - a.y * b.x
}

/// CCW perpendicular: rotates `v` by +90 degrees.
pub fn perp(v: Vector) -> Vector {
    Vector::new(-v.y, v.x)
}

/// `v` normalized, or the zero vector if `v` is (numerically) zero.
pub fn unitary(v: Vector) -> Vector {
    let len = v.mag();
    if len < f64::EPSILON {
        Vector::zero()
    } else {
        v / len
    }
}

/// Angular cross product: the linear velocity contribution of angular velocity `omega` at
/// offset `r` from a rotation center, i.e. `omega x r` in the 2D cross sense.
pub fn angular_cross(omega: f64, r: Vector) -> Vector {
    Vector::new(-omega * r.y, omega * r.x)
}

/// Wraps an angle into `(-pi, pi]`.
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// A 2x2 rotation matrix, built from an angle. The only operation the rest of the crate needs
/// from a general 2x2 matrix is "rotate a vector by this angle", so this stores just the
/// angle's sine and cosine rather than four independent entries.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix22 {
    cos: f64,
    sin: f64,
}

impl Matrix22 {
    pub fn from_angle(angle: f64) -> Self {
        Matrix22 {
            cos: angle.cos(),
            sin: angle.sin(),
        }
    }

    pub fn rotate(&self, v: Vector) -> Vector {
        Vector::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }
}

/// A rigid 2D pose: a translation plus a rotation, applied rotation-then-translation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub pos: Point,
    pub angle: f64,
}

impl Pose {
    pub fn new(pos: Point, angle: f64) -> Self {
        Pose { pos, angle }
    }

    /// Transforms a body-local point into world space.
    pub fn transform_point(&self, local: Point) -> Point {
        self.pos + Matrix22::from_angle(self.angle).rotate(local)
    }

    /// Composes a child pose (offset, relative angle) expressed in this pose's frame.
    pub fn compose(&self, offset: Point, relative_angle: f64) -> Pose {
        Pose {
            pos: self.transform_point(offset),
            angle: normalize_angle(self.angle + relative_angle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn unitary_of_zero_is_zero() {
        assert_eq!(unitary(Vector::zero()), Vector::zero());
    }

    #[test]
    fn angle_normalization_wraps_into_range() {
        let a = normalize_angle(3.0 * PI);
        assert!(a > -PI && a <= PI);
        let b = normalize_angle(-3.0 * PI);
        assert!(b > -PI && b <= PI);
    }

    #[test]
    fn rotation_by_90_degrees_matches_perp() {
        let m = Matrix22::from_angle(PI / 2.0);
        let v = Vector::new(1.0, 0.0);
        let rotated = m.rotate(v);
        assert!((rotated - perp(v)).mag() < 1e-9);
    }

    #[test]
    fn angular_cross_matches_spec_formula() {
        let r = Vector::new(2.0, 3.0);
        let omega = 1.5;
        let got = angular_cross(omega, r);
        assert_eq!(got, Vector::new(-omega * r.y, omega * r.x));
    }
}
