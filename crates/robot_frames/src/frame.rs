use std::fmt;
use std::ops::Mul;

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};

use crate::{EPSILON, Rotation, Twist, Vector, Wrench};

/// A rigid transform: orientation `m` and origin `p` of one coordinate frame
/// expressed in another
///
/// `a * b` composes transforms the same way homogeneous matrices multiply.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub m: Rotation,
    pub p: Vector,
}

impl Frame {
    pub fn new(m: Rotation, p: Vector) -> Self {
        Self { m, p }
    }

    pub fn identity() -> Self {
        Self::new(Rotation::identity(), Vector::zero())
    }

    /// Pure rotation
    pub fn from_rotation(m: Rotation) -> Self {
        Self::new(m, Vector::zero())
    }

    /// Pure translation
    pub fn from_translation(p: Vector) -> Self {
        Self::new(Rotation::identity(), p)
    }

    /// Link transform from modified Denavit-Hartenberg parameters (Craig 1989)
    pub fn dh_craig1989(a: f64, alpha: f64, d: f64, theta: f64) -> Self {
        let (st, ct) = theta.sin_cos();
        let (sa, ca) = alpha.sin_cos();
        Self::new(
            Rotation::new(ct, -st, 0.0, st * ca, ct * ca, -sa, st * sa, ct * sa, ca),
            Vector::new(a, -sa * d, ca * d),
        )
    }

    /// Link transform from classic Denavit-Hartenberg parameters
    ///
    /// # Example
    /// ```rust
    /// use robot_frames::{Frame, Vector};
    ///
    /// let f = Frame::dh(0.5, 0.0, 0.0, 0.0);
    /// assert_eq!(f.p, Vector::new(0.5, 0.0, 0.0));
    /// ```
    pub fn dh(a: f64, alpha: f64, d: f64, theta: f64) -> Self {
        let (st, ct) = theta.sin_cos();
        let (sa, ca) = alpha.sin_cos();
        Self::new(
            Rotation::new(ct, -st * ca, st * sa, st, ct * ca, -ct * sa, 0.0, sa, ca),
            Vector::new(a * ct, a * st, d),
        )
    }

    pub fn inverse(&self) -> Frame {
        let m = self.m.inverse();
        Self::new(m, -(m * self.p))
    }

    /// Map a point through the inverse transform without forming it
    pub fn inverse_vector(&self, v: Vector) -> Vector {
        self.m.inverse_vector(v - self.p)
    }

    pub fn inverse_twist(&self, t: Twist) -> Twist {
        Twist::new(
            self.m.inverse_vector(t.vel - self.p * t.rot),
            self.m.inverse_vector(t.rot),
        )
    }

    pub fn inverse_wrench(&self, w: Wrench) -> Wrench {
        Wrench::new(
            self.m.inverse_vector(w.force),
            self.m.inverse_vector(w.torque - self.p * w.force),
        )
    }

    /// The 4x4 homogeneous matrix
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut h = Matrix4::identity();
        h.fixed_view_mut::<3, 3>(0, 0).copy_from(self.m.matrix());
        h.fixed_view_mut::<3, 1>(0, 3).copy_from(self.p.as_nalgebra());
        h
    }
}

impl Mul for Frame {
    type Output = Frame;

    fn mul(self, rhs: Frame) -> Frame {
        Self::new(self.m * rhs.m, self.m * rhs.p + self.p)
    }
}

/// Transform a point
impl Mul<Vector> for Frame {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        self.m * rhs + self.p
    }
}

/// Change both the coordinates and the reference point of a twist
impl Mul<Twist> for Frame {
    type Output = Twist;

    fn mul(self, rhs: Twist) -> Twist {
        let rot = self.m * rhs.rot;
        Twist::new(self.m * rhs.vel + self.p * rot, rot)
    }
}

impl Mul<Wrench> for Frame {
    type Output = Wrench;

    fn mul(self, rhs: Wrench) -> Wrench {
        let force = self.m * rhs.force;
        Wrench::new(force, self.m * rhs.torque + self.p * force)
    }
}

impl From<Isometry3<f64>> for Frame {
    fn from(iso: Isometry3<f64>) -> Self {
        Self::new(
            Rotation::from(iso.rotation),
            Vector::from(iso.translation.vector),
        )
    }
}

impl From<Frame> for Isometry3<f64> {
    fn from(f: Frame) -> Self {
        Isometry3::from_parts(
            Translation3::from(Vector3::from(f.p)),
            UnitQuaternion::from(f.m),
        )
    }
}

impl AbsDiffEq for Frame {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.m.abs_diff_eq(&other.m, epsilon) && self.p.abs_diff_eq(&other.p, epsilon)
    }
}

impl RelativeEq for Frame {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.m.relative_eq(&other.m, epsilon, max_relative)
            && self.p.relative_eq(&other.p, epsilon, max_relative)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[m: {},\n p: {}]", self.m, self.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> Frame {
        Frame::new(
            Rotation::rpy(10f64.to_radians(), 20f64.to_radians(), -30f64.to_radians()),
            Vector::new(4.0, -2.0, 1.0),
        )
    }

    #[test]
    fn test_compose_with_inverse() {
        let f = sample();
        assert_abs_diff_eq!(f * f.inverse(), Frame::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(f.inverse() * f, Frame::identity(), epsilon = 1e-12);
        assert_eq!(Frame::identity() * f, f);
    }

    #[test]
    fn test_inverse_of_product() {
        let f1 = sample();
        let f2 = Frame::new(Rotation::euler_zyz(0.3, 1.0, -0.2), Vector::new(-1.0, 0.5, 2.5));
        assert_abs_diff_eq!(
            (f1 * f2).inverse(),
            f2.inverse() * f1.inverse(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_point_transform() {
        let f = Frame::new(Rotation::rot_z(FRAC_PI_2), Vector::new(1.0, 0.0, 0.0));
        let v = f * Vector::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(v, Vector::new(1.0, 1.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_apply_matches_inverse_frame() {
        let f = sample();
        let v = Vector::new(3.0, 4.0, 5.0);
        let t = Twist::new(Vector::new(6.0, 3.0, 5.0), Vector::new(4.0, -2.0, 7.0));
        let w = Wrench::new(Vector::new(7.0, -1.0, 3.0), Vector::new(2.0, -3.0, 3.0));

        assert_abs_diff_eq!(f.inverse_vector(v), f.inverse() * v, epsilon = 1e-12);
        assert_abs_diff_eq!(f.inverse_twist(t), f.inverse() * t, epsilon = 1e-12);
        assert_abs_diff_eq!(f.inverse_wrench(w), f.inverse() * w, epsilon = 1e-12);

        assert_abs_diff_eq!(f.inverse_vector(f * v), v, epsilon = 1e-12);
        assert_abs_diff_eq!(f.inverse_twist(f * t), t, epsilon = 1e-12);
        assert_abs_diff_eq!(f.inverse_wrench(f * w), w, epsilon = 1e-12);
    }

    #[test]
    fn test_twist_transform_matches_rotate_then_ref_point() {
        let f = sample();
        let t = Twist::new(Vector::new(6.0, 3.0, 5.0), Vector::new(4.0, -2.0, 7.0));
        let expected = (f.m * t).ref_point(-f.p);
        assert_abs_diff_eq!(f * t, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_power_preserved_by_frame_change() {
        let f = sample();
        let t = Twist::new(Vector::new(6.0, 3.0, 5.0), Vector::new(4.0, -2.0, 7.0));
        let w = Wrench::new(Vector::new(7.0, -1.0, 3.0), Vector::new(2.0, -3.0, 3.0));
        assert!(((f * t).dot(&(f * w)) - t.dot(&w)).abs() < 1e-10);
    }

    #[test]
    fn test_dh_conventions() {
        // A planar link of length 2 rotated by 90 degrees
        let f = Frame::dh(2.0, 0.0, 0.0, FRAC_PI_2);
        assert_abs_diff_eq!(
            f,
            Frame::new(Rotation::rot_z(FRAC_PI_2), Vector::new(0.0, 2.0, 0.0)),
            epsilon = 1e-15
        );

        let (a, alpha, d, theta) = (0.3, 0.7, 1.1, -0.4);
        let classic = Frame::from_rotation(Rotation::rot_z(theta))
            * Frame::from_translation(Vector::new(0.0, 0.0, d))
            * Frame::from_translation(Vector::new(a, 0.0, 0.0))
            * Frame::from_rotation(Rotation::rot_x(alpha));
        assert_abs_diff_eq!(Frame::dh(a, alpha, d, theta), classic, epsilon = 1e-14);

        let modified = Frame::from_rotation(Rotation::rot_x(alpha))
            * Frame::from_translation(Vector::new(a, 0.0, 0.0))
            * Frame::from_rotation(Rotation::rot_z(theta))
            * Frame::from_translation(Vector::new(0.0, 0.0, d));
        assert_abs_diff_eq!(
            Frame::dh_craig1989(a, alpha, d, theta),
            modified,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_homogeneous_and_isometry() {
        let f = sample();
        let h = f.to_homogeneous();
        assert_eq!(h[(0, 3)], 4.0);
        assert_eq!(h[(3, 3)], 1.0);
        assert_eq!(h[(3, 0)], 0.0);
        assert_eq!(h[(1, 2)], f.m[(1, 2)]);

        let iso: Isometry3<f64> = f.into();
        assert_abs_diff_eq!(Frame::from(iso), f, epsilon = 1e-12);
    }
}
