//! Finite differences between poses and their inverse, integration of a
//! velocity over a time step.
//!
//! For any `a` and `b` of the same type,
//! `a.add_delta(&a.diff(&b, dt), dt)` recovers `b` up to rounding, as long
//! as the rotation from `a` to `b` stays below half a turn.

use crate::{Frame, Rotation, Twist, Vector, Wrench};

/// Velocity-like difference between two values of a geometric type
pub trait Delta: Sized {
    /// The velocity type: `Vector` for points and rotations, `Twist` for
    /// frames
    type Derivative;

    /// Constant velocity that moves `self` onto `other` in time `dt`
    ///
    /// Rotational parts are expressed in the base frame, not in `self`.
    fn diff(&self, other: &Self, dt: f64) -> Self::Derivative;

    /// Move `self` with velocity `d` for time `dt`
    fn add_delta(&self, d: &Self::Derivative, dt: f64) -> Self;
}

/// [`Delta::diff`] over a unit time step
///
/// # Example
/// ```rust
/// use robot_frames::{diff, Rotation, Vector};
/// use approx::assert_abs_diff_eq;
///
/// let w = diff(&Rotation::identity(), &Rotation::rot_z(0.2));
/// assert_abs_diff_eq!(w, Vector::new(0.0, 0.0, 0.2), epsilon = 1e-12);
/// ```
pub fn diff<T: Delta>(a: &T, b: &T) -> T::Derivative {
    a.diff(b, 1.0)
}

impl Delta for Vector {
    type Derivative = Vector;

    fn diff(&self, other: &Self, dt: f64) -> Vector {
        (*other - *self) / dt
    }

    fn add_delta(&self, d: &Vector, dt: f64) -> Self {
        *self + *d * dt
    }
}

impl Delta for Rotation {
    type Derivative = Vector;

    fn diff(&self, other: &Self, dt: f64) -> Vector {
        *self * (self.inverse() * *other).rot_vector() / dt
    }

    fn add_delta(&self, d: &Vector, dt: f64) -> Self {
        *self * Rotation::from_rot_vector(self.inverse_vector(*d) * dt)
    }
}

impl Delta for Frame {
    type Derivative = Twist;

    fn diff(&self, other: &Self, dt: f64) -> Twist {
        Twist::new(self.p.diff(&other.p, dt), self.m.diff(&other.m, dt))
    }

    fn add_delta(&self, d: &Twist, dt: f64) -> Self {
        Frame::new(self.m.add_delta(&d.rot, dt), self.p.add_delta(&d.vel, dt))
    }
}

impl Delta for Twist {
    type Derivative = Twist;

    fn diff(&self, other: &Self, dt: f64) -> Twist {
        Twist::new(self.vel.diff(&other.vel, dt), self.rot.diff(&other.rot, dt))
    }

    fn add_delta(&self, d: &Twist, dt: f64) -> Self {
        Twist::new(
            self.vel.add_delta(&d.vel, dt),
            self.rot.add_delta(&d.rot, dt),
        )
    }
}

impl Delta for Wrench {
    type Derivative = Wrench;

    fn diff(&self, other: &Self, dt: f64) -> Wrench {
        Wrench::new(
            self.force.diff(&other.force, dt),
            self.torque.diff(&other.torque, dt),
        )
    }

    fn add_delta(&self, d: &Wrench, dt: f64) -> Self {
        Wrench::new(
            self.force.add_delta(&d.force, dt),
            self.torque.add_delta(&d.torque, dt),
        )
    }
}
