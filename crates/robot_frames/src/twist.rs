use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Vector6;

use crate::{EPSILON, Vector, Wrench};

/// A spatial velocity: linear velocity of a reference point plus angular
/// velocity
///
/// Indexing runs over six components, `0..3` for `vel` and `3..6` for `rot`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Twist {
    pub vel: Vector,
    pub rot: Vector,
}

impl Twist {
    pub fn new(vel: Vector, rot: Vector) -> Self {
        Self { vel, rot }
    }

    pub fn zero() -> Self {
        Self::new(Vector::zero(), Vector::zero())
    }

    /// Express the same motion with the reference point moved by `v`
    ///
    /// `v` is the vector from the old reference point to the new one, in the
    /// same coordinates as the twist.
    ///
    /// # Example
    /// ```rust
    /// use robot_frames::{Twist, Vector};
    ///
    /// // Spinning about Z: a point one unit along X moves along Y
    /// let t = Twist::new(Vector::zero(), Vector::new(0.0, 0.0, 1.0));
    /// let moved = t.ref_point(Vector::new(1.0, 0.0, 0.0));
    /// assert_eq!(moved.vel, Vector::new(0.0, 1.0, 0.0));
    /// assert_eq!(moved.rot, t.rot);
    /// ```
    pub fn ref_point(&self, v: Vector) -> Twist {
        Self::new(self.vel + self.rot * v, self.rot)
    }

    pub fn reverse_sign(&mut self) {
        self.vel.reverse_sign();
        self.rot.reverse_sign();
    }

    pub fn set_to_zero(&mut self) {
        self.vel.set_to_zero();
        self.rot.set_to_zero();
    }

    /// Power delivered by a wrench moving with this twist
    pub fn dot(&self, w: &Wrench) -> f64 {
        self.vel.dot(&w.force) + self.rot.dot(&w.torque)
    }

    /// Euclidean norm over all six components
    pub fn norm(&self) -> f64 {
        (self.vel.dot(&self.vel) + self.rot.dot(&self.rot)).sqrt()
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.vel.x(),
            self.vel.y(),
            self.vel.z(),
            self.rot.x(),
            self.rot.y(),
            self.rot.z(),
        ]
    }
}

impl Index<usize> for Twist {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        match index {
            0..3 => &self.vel[index],
            3..6 => &self.rot[index - 3],
            _ => panic!("twist index {index} out of range 0..6"),
        }
    }
}

impl IndexMut<usize> for Twist {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            0..3 => &mut self.vel[index],
            3..6 => &mut self.rot[index - 3],
            _ => panic!("twist index {index} out of range 0..6"),
        }
    }
}

impl From<[f64; 6]> for Twist {
    fn from(a: [f64; 6]) -> Self {
        Self::new(Vector::new(a[0], a[1], a[2]), Vector::new(a[3], a[4], a[5]))
    }
}

impl From<Vector6<f64>> for Twist {
    fn from(v: Vector6<f64>) -> Self {
        Self::new(Vector::new(v[0], v[1], v[2]), Vector::new(v[3], v[4], v[5]))
    }
}

impl From<Twist> for Vector6<f64> {
    fn from(t: Twist) -> Self {
        Vector6::from(t.as_array())
    }
}

impl Add for Twist {
    type Output = Twist;

    fn add(self, rhs: Twist) -> Twist {
        Self::new(self.vel + rhs.vel, self.rot + rhs.rot)
    }
}

impl AddAssign for Twist {
    fn add_assign(&mut self, rhs: Twist) {
        self.vel += rhs.vel;
        self.rot += rhs.rot;
    }
}

impl Sub for Twist {
    type Output = Twist;

    fn sub(self, rhs: Twist) -> Twist {
        Self::new(self.vel - rhs.vel, self.rot - rhs.rot)
    }
}

impl SubAssign for Twist {
    fn sub_assign(&mut self, rhs: Twist) {
        self.vel -= rhs.vel;
        self.rot -= rhs.rot;
    }
}

impl Neg for Twist {
    type Output = Twist;

    fn neg(self) -> Twist {
        Self::new(-self.vel, -self.rot)
    }
}

impl Mul<f64> for Twist {
    type Output = Twist;

    fn mul(self, rhs: f64) -> Twist {
        Self::new(self.vel * rhs, self.rot * rhs)
    }
}

impl Mul<Twist> for f64 {
    type Output = Twist;

    fn mul(self, rhs: Twist) -> Twist {
        rhs * self
    }
}

impl Div<f64> for Twist {
    type Output = Twist;

    fn div(self, rhs: f64) -> Twist {
        Self::new(self.vel / rhs, self.rot / rhs)
    }
}

impl AbsDiffEq for Twist {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.vel.abs_diff_eq(&other.vel, epsilon) && self.rot.abs_diff_eq(&other.rot, epsilon)
    }
}

impl RelativeEq for Twist {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.vel.relative_eq(&other.vel, epsilon, max_relative)
            && self.rot.relative_eq(&other.rot, epsilon, max_relative)
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[vel: {}, rot: {}]", self.vel, self.rot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Twist {
        Twist::new(Vector::new(6.0, 3.0, 5.0), Vector::new(4.0, -2.0, 7.0))
    }

    #[test]
    fn test_six_component_indexing() {
        let mut t = sample();
        assert_eq!(t.as_array(), [6.0, 3.0, 5.0, 4.0, -2.0, 7.0]);
        for i in 0..6 {
            assert_eq!(t[i], t.as_array()[i]);
        }
        t[4] = 1.0;
        assert_eq!(t.rot, Vector::new(4.0, 1.0, 7.0));
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_range() {
        let _ = sample()[6];
    }

    #[test]
    fn test_arithmetic() {
        let t = sample();
        assert_eq!(2.0 * t - t, t);
        assert_eq!(t * 2.0 - t, t);
        assert_eq!(t + t + t - 2.0 * t, t);
        assert_eq!((t * 2.0) / 2.0, t);
        assert_eq!(t + (-t), Twist::zero());

        let mut u = t;
        u += t;
        u -= t;
        assert_eq!(u, t);
        u.reverse_sign();
        assert_eq!(u, -t);
        u.set_to_zero();
        assert_eq!(u, Twist::zero());
    }

    #[test]
    fn test_ref_point_round_trip() {
        let t = sample();
        let v = Vector::new(3.0, 4.0, 5.0);
        assert_abs_diff_eq!(t.ref_point(v).ref_point(-v), t, epsilon = 1e-12);
        assert_eq!(t.ref_point(Vector::zero()), t);
    }

    #[test]
    fn test_dot_with_wrench() {
        let t = sample();
        let w = Wrench::new(Vector::new(1.0, 0.0, 0.0), Vector::new(0.0, 1.0, 0.0));
        assert_eq!(t.dot(&w), 6.0 - 2.0);
        assert_eq!(w.dot(&t), t.dot(&w));
    }

    #[test]
    fn test_norm() {
        let t = Twist::from([1.0, 2.0, 2.0, 0.0, 0.0, 4.0]);
        assert!((t.norm() - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_nalgebra_conversion() {
        let t = sample();
        let v: Vector6<f64> = t.into();
        assert_eq!(v[3], 4.0);
        assert_eq!(Twist::from(v), t);
    }
}
