use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Vector3;

use crate::{EPSILON, Error, Result};

/// A free vector in 3D space
///
/// `Vector * Vector` is the **cross product**. Use [`Vector::dot`] for the
/// inner product; there is no element-wise product operator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    data: Vector3<f64>,
}

impl Vector {
    /// Create a vector from its three components
    ///
    /// # Example
    /// ```rust
    /// use robot_frames::Vector;
    ///
    /// let v = Vector::new(1.0, 2.0, 3.0);
    /// assert_eq!(v.y(), 2.0);
    /// ```
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            data: Vector3::new(x, y, z),
        }
    }

    /// The zero vector
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn x(&self) -> f64 {
        self.data.x
    }

    pub fn y(&self) -> f64 {
        self.data.y
    }

    pub fn z(&self) -> f64 {
        self.data.z
    }

    pub fn set_x(&mut self, x: f64) {
        self.data.x = x;
    }

    pub fn set_y(&mut self, y: f64) {
        self.data.y = y;
    }

    pub fn set_z(&mut self, z: f64) {
        self.data.z = z;
    }

    /// Euclidean length
    pub fn norm(&self) -> f64 {
        self.data.norm()
    }

    /// Inner product
    pub fn dot(&self, other: &Vector) -> f64 {
        self.data.dot(&other.data)
    }

    /// Cross product, same as `self * other`
    pub fn cross(&self, other: &Vector) -> Vector {
        Self {
            data: self.data.cross(&other.data),
        }
    }

    /// Scale the vector to unit length in place and return its previous norm
    ///
    /// A vector whose norm is below [`EPSILON`] has no direction; it is left
    /// untouched and [`Error::Undefined`] is returned.
    ///
    /// # Example
    /// ```rust
    /// use robot_frames::Vector;
    ///
    /// let mut v = Vector::new(3.0, 0.0, 4.0);
    /// assert_eq!(v.normalize().unwrap(), 5.0);
    /// assert!((v.norm() - 1.0).abs() < 1e-12);
    ///
    /// assert!(Vector::zero().normalize().is_err());
    /// ```
    pub fn normalize(&mut self) -> Result<f64> {
        let n = self.norm();
        if n < EPSILON {
            return Err(Error::Undefined {
                message: "cannot normalize a zero-length vector",
            });
        }
        self.data /= n;
        Ok(n)
    }

    /// Unit vector pointing in the same direction
    pub fn normalized(&self) -> Result<Vector> {
        let mut v = *self;
        v.normalize()?;
        Ok(v)
    }

    pub fn reverse_sign(&mut self) {
        self.data = -self.data;
    }

    pub fn set_to_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Borrow the underlying nalgebra vector
    pub fn as_nalgebra(&self) -> &Vector3<f64> {
        &self.data
    }
}

impl Default for Vector {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Vector3<f64>> for Vector {
    fn from(data: Vector3<f64>) -> Self {
        Self { data }
    }
}

impl From<Vector> for Vector3<f64> {
    fn from(v: Vector) -> Self {
        v.data
    }
}

impl From<[f64; 3]> for Vector {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Self {
            data: self.data + rhs.data,
        }
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.data += rhs.data;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Self {
            data: self.data - rhs.data,
        }
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.data -= rhs.data;
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Self { data: -self.data }
    }
}

/// Cross product
impl Mul for Vector {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        self.cross(&rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Self {
            data: self.data * rhs,
        }
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        rhs * self
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, rhs: f64) {
        self.data *= rhs;
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, rhs: f64) -> Vector {
        Self {
            data: self.data / rhs,
        }
    }
}

impl DivAssign<f64> for Vector {
    fn div_assign(&mut self, rhs: f64) {
        self.data /= rhs;
    }
}

impl AbsDiffEq for Vector {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.data.abs_diff_eq(&other.data, epsilon)
    }
}

impl RelativeEq for Vector {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.data.relative_eq(&other.data, epsilon, max_relative)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x(), self.y(), self.z())
    }
}
