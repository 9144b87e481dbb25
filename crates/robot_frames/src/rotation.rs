use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::ops::{Index, IndexMut, Mul};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion};

use crate::{EPSILON, Twist, Vector, Wrench};

/// A 3x3 rotation matrix
///
/// A valid value is orthonormal with determinant +1. The raw constructors
/// [`Rotation::new`] and [`Rotation::from_columns`] do not check this; feeding
/// them anything other than a proper rotation gives meaningless results from
/// every other method.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    data: Matrix3<f64>,
}

impl Rotation {
    /// Build a rotation from nine values given row by row
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        xx: f64,
        yx: f64,
        zx: f64,
        xy: f64,
        yy: f64,
        zy: f64,
        xz: f64,
        yz: f64,
        zz: f64,
    ) -> Self {
        Self {
            data: Matrix3::new(xx, yx, zx, xy, yy, zy, xz, yz, zz),
        }
    }

    /// Build a rotation whose columns are the given basis vectors
    pub fn from_columns(x: Vector, y: Vector, z: Vector) -> Self {
        Self::new(
            x.x(),
            y.x(),
            z.x(),
            x.y(),
            y.y(),
            z.y(),
            x.z(),
            y.z(),
            z.z(),
        )
    }

    pub fn identity() -> Self {
        Self {
            data: Matrix3::identity(),
        }
    }

    /// Rotation of `angle` radians about the X axis
    pub fn rot_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
    }

    /// Rotation of `angle` radians about the Y axis
    pub fn rot_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
    }

    /// Rotation of `angle` radians about the Z axis
    pub fn rot_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians about an arbitrary axis
    ///
    /// The axis does not need to be normalized. An axis shorter than
    /// [`EPSILON`] has no direction and yields the identity.
    ///
    /// # Example
    /// ```rust
    /// use robot_frames::{Rotation, Vector};
    /// use approx::assert_abs_diff_eq;
    ///
    /// let r = Rotation::rot(Vector::new(0.0, 0.0, 5.0), 0.4);
    /// assert_abs_diff_eq!(r, Rotation::rot_z(0.4), epsilon = 1e-15);
    /// ```
    pub fn rot(axis: Vector, angle: f64) -> Self {
        match axis.normalized() {
            Ok(unit) => Self::rot_normalized(unit, angle),
            Err(_) => Self::identity(),
        }
    }

    /// Rotation from a rotation vector: direction is the axis, length the
    /// angle
    pub fn from_rot_vector(v: Vector) -> Self {
        Self::rot(v, v.norm())
    }

    /// Rotation of `angle` radians about an axis that is already unit length
    pub fn rot_normalized(axis: Vector, angle: f64) -> Self {
        let (st, ct) = angle.sin_cos();
        let vt = 1.0 - ct;
        let (x, y, z) = (axis.x(), axis.y(), axis.z());
        Self::new(
            ct + vt * x * x,
            vt * x * y - st * z,
            vt * x * z + st * y,
            vt * x * y + st * z,
            ct + vt * y * y,
            vt * y * z - st * x,
            vt * x * z - st * y,
            vt * y * z + st * x,
            ct + vt * z * z,
        )
    }

    /// Rotation from Euler angles: `alpha` about Z, then `beta` about the new
    /// Y, then `gamma` about the new Z
    pub fn euler_zyz(alpha: f64, beta: f64, gamma: f64) -> Self {
        let (sa, ca) = alpha.sin_cos();
        let (sb, cb) = beta.sin_cos();
        let (sg, cg) = gamma.sin_cos();
        Self::new(
            ca * cb * cg - sa * sg,
            -ca * cb * sg - sa * cg,
            ca * sb,
            sa * cb * cg + ca * sg,
            -sa * cb * sg + ca * cg,
            sa * sb,
            -sb * cg,
            sb * sg,
            cb,
        )
    }

    /// Rotation from Euler angles: `alpha` about Z, then `beta` about the new
    /// Y, then `gamma` about the new X
    ///
    /// Same as `rpy(gamma, beta, alpha)`.
    pub fn euler_zyx(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self::rpy(gamma, beta, alpha)
    }

    /// Rotation from roll, pitch and yaw about the fixed X, Y and Z axes
    ///
    /// Equivalent to `rot_z(yaw) * rot_y(pitch) * rot_x(roll)`.
    pub fn rpy(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sa, ca) = yaw.sin_cos();
        let (sb, cb) = pitch.sin_cos();
        let (sc, cc) = roll.sin_cos();
        Self::new(
            ca * cb,
            ca * sb * sc - sa * cc,
            ca * sb * cc + sa * sc,
            sa * cb,
            sa * sb * sc + ca * cc,
            sa * sb * cc - ca * sc,
            -sb,
            cb * sc,
            cb * cc,
        )
    }

    /// Equivalent axis and angle, detecting degenerate cases with [`EPSILON`]
    ///
    /// See [`Rotation::rot_angle_eps`].
    pub fn rot_angle(&self) -> (f64, Vector) {
        self.rot_angle_eps(EPSILON)
    }

    /// Equivalent axis and angle
    ///
    /// The axis is unit length and the angle lies in `[0, PI]`. The identity
    /// returns an angle of zero and the zero vector as axis. For half turns
    /// the sign of the axis is arbitrary.
    pub fn rot_angle_eps(&self, eps: f64) -> (f64, Vector) {
        let m = &self.data;
        let eps2 = eps * 10.0;

        let symmetric = (m[(0, 1)] - m[(1, 0)]).abs() < eps
            && (m[(0, 2)] - m[(2, 0)]).abs() < eps
            && (m[(1, 2)] - m[(2, 1)]).abs() < eps;

        if symmetric {
            let identity = (m[(0, 1)] + m[(1, 0)]).abs() < eps2
                && (m[(0, 2)] + m[(2, 0)]).abs() < eps2
                && (m[(1, 2)] + m[(2, 1)]).abs() < eps2
                && (m.trace() - 3.0).abs() < eps2;
            if identity {
                return (0.0, Vector::zero());
            }

            // Half turn: recover the axis from the largest diagonal term
            let xx = (m[(0, 0)] + 1.0) / 2.0;
            let yy = (m[(1, 1)] + 1.0) / 2.0;
            let zz = (m[(2, 2)] + 1.0) / 2.0;
            let xy = (m[(0, 1)] + m[(1, 0)]) / 4.0;
            let xz = (m[(0, 2)] + m[(2, 0)]) / 4.0;
            let yz = (m[(1, 2)] + m[(2, 1)]) / 4.0;

            let axis = if xx > yy && xx > zz {
                let x = xx.sqrt();
                Vector::new(x, xy / x, xz / x)
            } else if yy > zz {
                let y = yy.sqrt();
                Vector::new(xy / y, y, yz / y)
            } else {
                let z = zz.sqrt();
                Vector::new(xz / z, yz / z, z)
            };
            return (PI, axis);
        }

        let f = (m.trace() - 1.0) / 2.0;
        let axis = Vector::new(
            m[(2, 1)] - m[(1, 2)],
            m[(0, 2)] - m[(2, 0)],
            m[(1, 0)] - m[(0, 1)],
        );
        let angle = (axis.norm() / 2.0).atan2(f);
        // Not symmetric, so the axis has a length of at least eps
        let axis = axis.normalized().unwrap_or(axis);
        (angle, axis)
    }

    /// Rotation vector: the equivalent axis scaled by the angle
    pub fn rot_vector(&self) -> Vector {
        let (angle, axis) = self.rot_angle();
        axis * angle
    }

    /// Euler ZYZ angles `(alpha, beta, gamma)` with `beta` in `[0, PI]`
    ///
    /// When `beta` is 0 or PI the first and last rotations share an axis;
    /// `gamma` is then reported as zero and `alpha` carries the whole turn.
    pub fn euler_zyz_angles(&self) -> (f64, f64, f64) {
        let m = &self.data;
        if m[(2, 2)].abs() > 1.0 - EPSILON {
            if m[(2, 2)] > 0.0 {
                (m[(1, 0)].atan2(m[(0, 0)]), 0.0, 0.0)
            } else {
                ((-m[(1, 0)]).atan2(-m[(0, 0)]), PI, 0.0)
            }
        } else {
            let alpha = m[(1, 2)].atan2(m[(0, 2)]);
            let beta = m[(2, 0)].hypot(m[(2, 1)]).atan2(m[(2, 2)]);
            let gamma = m[(2, 1)].atan2(-m[(2, 0)]);
            (alpha, beta, gamma)
        }
    }

    /// Euler ZYX angles `(alpha, beta, gamma)`, the reverse of [`Rotation::euler_zyx`]
    pub fn euler_zyx_angles(&self) -> (f64, f64, f64) {
        let (roll, pitch, yaw) = self.rpy_angles();
        (yaw, pitch, roll)
    }

    /// Roll, pitch and yaw with pitch in `[-PI/2, PI/2]`
    ///
    /// At `pitch = +-PI/2` roll and yaw share an axis; roll is reported as
    /// zero.
    pub fn rpy_angles(&self) -> (f64, f64, f64) {
        const GIMBAL_EPS: f64 = 1e-12;
        let m = &self.data;
        let pitch = (-m[(2, 0)]).atan2(m[(0, 0)].hypot(m[(1, 0)]));
        if pitch.abs() > FRAC_PI_2 - GIMBAL_EPS {
            (0.0, pitch, (-m[(0, 1)]).atan2(m[(1, 1)]))
        } else {
            (
                m[(2, 1)].atan2(m[(2, 2)]),
                pitch,
                m[(1, 0)].atan2(m[(0, 0)]),
            )
        }
    }

    /// First column
    pub fn unit_x(&self) -> Vector {
        Vector::new(self.data[(0, 0)], self.data[(1, 0)], self.data[(2, 0)])
    }

    /// Second column
    pub fn unit_y(&self) -> Vector {
        Vector::new(self.data[(0, 1)], self.data[(1, 1)], self.data[(2, 1)])
    }

    /// Third column
    pub fn unit_z(&self) -> Vector {
        Vector::new(self.data[(0, 2)], self.data[(1, 2)], self.data[(2, 2)])
    }

    /// The inverse rotation, which is the transpose
    pub fn inverse(&self) -> Rotation {
        Self {
            data: self.data.transpose(),
        }
    }

    /// Apply the inverse rotation without forming it
    pub fn inverse_vector(&self, v: Vector) -> Vector {
        Vector::from(self.data.tr_mul(v.as_nalgebra()))
    }

    pub fn inverse_twist(&self, t: Twist) -> Twist {
        Twist::new(self.inverse_vector(t.vel), self.inverse_vector(t.rot))
    }

    pub fn inverse_wrench(&self, w: Wrench) -> Wrench {
        Wrench::new(self.inverse_vector(w.force), self.inverse_vector(w.torque))
    }

    pub fn determinant(&self) -> f64 {
        self.data.determinant()
    }

    /// Borrow the underlying matrix
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.data
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<(usize, usize)> for Rotation {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize)> for Rotation {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.data[index]
    }
}

impl Mul for Rotation {
    type Output = Rotation;

    fn mul(self, rhs: Rotation) -> Rotation {
        Self {
            data: self.data * rhs.data,
        }
    }
}

impl Mul<Vector> for Rotation {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        Vector::from(self.data * rhs.as_nalgebra())
    }
}

impl Mul<Twist> for Rotation {
    type Output = Twist;

    fn mul(self, rhs: Twist) -> Twist {
        Twist::new(self * rhs.vel, self * rhs.rot)
    }
}

impl Mul<Wrench> for Rotation {
    type Output = Wrench;

    fn mul(self, rhs: Wrench) -> Wrench {
        Wrench::new(self * rhs.force, self * rhs.torque)
    }
}

impl From<Rotation3<f64>> for Rotation {
    fn from(r: Rotation3<f64>) -> Self {
        Self { data: r.into_inner() }
    }
}

impl From<Rotation> for Rotation3<f64> {
    fn from(r: Rotation) -> Self {
        Rotation3::from_matrix_unchecked(r.data)
    }
}

impl From<UnitQuaternion<f64>> for Rotation {
    fn from(q: UnitQuaternion<f64>) -> Self {
        Self::from(q.to_rotation_matrix())
    }
}

impl From<Rotation> for UnitQuaternion<f64> {
    fn from(r: Rotation) -> Self {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from(r))
    }
}

impl AbsDiffEq for Rotation {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.data.abs_diff_eq(&other.data, epsilon)
    }
}

impl RelativeEq for Rotation {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.data.relative_eq(&other.data, epsilon, max_relative)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.data;
        write!(
            f,
            "[{}, {}, {};\n {}, {}, {};\n {}, {}, {}]",
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)]
        )
    }
}
