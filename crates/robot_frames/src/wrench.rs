use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Vector6;

use crate::{EPSILON, Twist, Vector};

/// A spatial force: force plus the torque about a reference point
///
/// Indexing runs over six components, `0..3` for `force` and `3..6` for
/// `torque`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wrench {
    pub force: Vector,
    pub torque: Vector,
}

impl Wrench {
    pub fn new(force: Vector, torque: Vector) -> Self {
        Self { force, torque }
    }

    pub fn zero() -> Self {
        Self::new(Vector::zero(), Vector::zero())
    }

    /// Express the same load about a reference point moved by `v`
    pub fn ref_point(&self, v: Vector) -> Wrench {
        Self::new(self.force, self.torque + self.force * v)
    }

    pub fn reverse_sign(&mut self) {
        self.force.reverse_sign();
        self.torque.reverse_sign();
    }

    pub fn set_to_zero(&mut self) {
        self.force.set_to_zero();
        self.torque.set_to_zero();
    }

    /// Power delivered by this wrench along a twist
    pub fn dot(&self, t: &Twist) -> f64 {
        t.dot(self)
    }

    pub fn norm(&self) -> f64 {
        (self.force.dot(&self.force) + self.torque.dot(&self.torque)).sqrt()
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.force.x(),
            self.force.y(),
            self.force.z(),
            self.torque.x(),
            self.torque.y(),
            self.torque.z(),
        ]
    }
}

impl Index<usize> for Wrench {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        match index {
            0..3 => &self.force[index],
            3..6 => &self.torque[index - 3],
            _ => panic!("wrench index {index} out of range 0..6"),
        }
    }
}

impl IndexMut<usize> for Wrench {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            0..3 => &mut self.force[index],
            3..6 => &mut self.torque[index - 3],
            _ => panic!("wrench index {index} out of range 0..6"),
        }
    }
}

impl From<[f64; 6]> for Wrench {
    fn from(a: [f64; 6]) -> Self {
        Self::new(Vector::new(a[0], a[1], a[2]), Vector::new(a[3], a[4], a[5]))
    }
}

impl From<Vector6<f64>> for Wrench {
    fn from(v: Vector6<f64>) -> Self {
        Self::new(Vector::new(v[0], v[1], v[2]), Vector::new(v[3], v[4], v[5]))
    }
}

impl From<Wrench> for Vector6<f64> {
    fn from(w: Wrench) -> Self {
        Vector6::from(w.as_array())
    }
}

impl Add for Wrench {
    type Output = Wrench;

    fn add(self, rhs: Wrench) -> Wrench {
        Self::new(self.force + rhs.force, self.torque + rhs.torque)
    }
}

impl AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Wrench) {
        self.force += rhs.force;
        self.torque += rhs.torque;
    }
}

impl Sub for Wrench {
    type Output = Wrench;

    fn sub(self, rhs: Wrench) -> Wrench {
        Self::new(self.force - rhs.force, self.torque - rhs.torque)
    }
}

impl SubAssign for Wrench {
    fn sub_assign(&mut self, rhs: Wrench) {
        self.force -= rhs.force;
        self.torque -= rhs.torque;
    }
}

impl Neg for Wrench {
    type Output = Wrench;

    fn neg(self) -> Wrench {
        Self::new(-self.force, -self.torque)
    }
}

impl Mul<f64> for Wrench {
    type Output = Wrench;

    fn mul(self, rhs: f64) -> Wrench {
        Self::new(self.force * rhs, self.torque * rhs)
    }
}

impl Mul<Wrench> for f64 {
    type Output = Wrench;

    fn mul(self, rhs: Wrench) -> Wrench {
        rhs * self
    }
}

impl Div<f64> for Wrench {
    type Output = Wrench;

    fn div(self, rhs: f64) -> Wrench {
        Self::new(self.force / rhs, self.torque / rhs)
    }
}

impl AbsDiffEq for Wrench {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.force.abs_diff_eq(&other.force, epsilon)
            && self.torque.abs_diff_eq(&other.torque, epsilon)
    }
}

impl RelativeEq for Wrench {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.force.relative_eq(&other.force, epsilon, max_relative)
            && self.torque.relative_eq(&other.torque, epsilon, max_relative)
    }
}

impl fmt::Display for Wrench {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[force: {}, torque: {}]", self.force, self.torque)
    }
}
