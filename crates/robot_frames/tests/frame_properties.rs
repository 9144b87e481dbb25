//! Property-based tests for rotations and frames.
//!
//! Run with: cargo test -p robot_frames -- proptest

use std::f64::consts::PI;

use approx::abs_diff_eq;
use proptest::prelude::*;
use robot_frames::{Delta, Frame, Rotation, Twist, Vector, Wrench};

fn arb_angle() -> impl Strategy<Value = f64> {
    -3.1..3.1f64
}

fn arb_vector() -> impl Strategy<Value = Vector> {
    prop::array::uniform3(-10.0..10.0f64).prop_map(Vector::from)
}

fn arb_rotation() -> impl Strategy<Value = Rotation> {
    (arb_angle(), arb_angle(), arb_angle()).prop_map(|(a, b, c)| Rotation::euler_zyz(a, b, c))
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    (arb_rotation(), arb_vector()).prop_map(|(m, p)| Frame::new(m, p))
}

fn arb_twist() -> impl Strategy<Value = Twist> {
    (arb_vector(), arb_vector()).prop_map(|(v, r)| Twist::new(v, r))
}

proptest! {
    #[test]
    fn proptest_rotation_inverse_is_transpose(r in arb_rotation()) {
        prop_assert!(abs_diff_eq!(r.inverse() * r, Rotation::identity(), epsilon = 1e-9));
        prop_assert!((r.determinant().abs() - 1.0).abs() < 1e-9);
        for i in 0..3 {
            for j in 0..3 {
                prop_assert_eq!(r.inverse()[(i, j)], r[(j, i)]);
            }
        }
    }

    #[test]
    fn proptest_frame_inverse(f in arb_frame()) {
        prop_assert!(abs_diff_eq!(f * f.inverse(), Frame::identity(), epsilon = 1e-9));
        prop_assert!(abs_diff_eq!(f.inverse() * f, Frame::identity(), epsilon = 1e-9));
    }

    #[test]
    fn proptest_inverse_of_product(f1 in arb_frame(), f2 in arb_frame()) {
        prop_assert!(abs_diff_eq!(
            (f1 * f2).inverse(),
            f2.inverse() * f1.inverse(),
            epsilon = 1e-9
        ));
    }

    #[test]
    fn proptest_euler_zyz_round_trip(a in arb_angle(), b in 0.01..(PI - 0.01), c in arb_angle()) {
        let r = Rotation::euler_zyz(a, b, c);
        let (ra, rb, rc) = r.euler_zyz_angles();
        prop_assert!((rb - b).abs() < 1e-9);
        prop_assert!(abs_diff_eq!(Rotation::euler_zyz(ra, rb, rc), r, epsilon = 1e-9));
    }

    #[test]
    fn proptest_rpy_round_trip(roll in arb_angle(), pitch in -1.5..1.5f64, yaw in arb_angle()) {
        let r = Rotation::rpy(roll, pitch, yaw);
        let (rr, rp, ry) = r.rpy_angles();
        prop_assert!((rr - roll).abs() < 1e-9);
        prop_assert!((rp - pitch).abs() < 1e-9);
        prop_assert!((ry - yaw).abs() < 1e-9);

        let (a, b, c) = Rotation::euler_zyx(yaw, pitch, roll).euler_zyx_angles();
        prop_assert!(abs_diff_eq!(Rotation::euler_zyx(a, b, c), r, epsilon = 1e-9));
    }

    #[test]
    fn proptest_rot_angle_round_trip(axis in arb_vector(), angle in 0.01..(PI - 0.01)) {
        prop_assume!(axis.norm() > 1e-3);
        let r = Rotation::rot(axis, angle);
        let (found_angle, found_axis) = r.rot_angle();
        prop_assert!((found_angle - angle).abs() < 1e-8);
        prop_assert!(abs_diff_eq!(found_axis, axis.normalized().unwrap(), epsilon = 1e-8));
    }

    #[test]
    fn proptest_twist_frame_change_round_trip(f in arb_frame(), t in arb_twist()) {
        prop_assert!(abs_diff_eq!(f.inverse_twist(f * t), t, epsilon = 1e-9));
    }

    #[test]
    fn proptest_power_is_frame_invariant(f in arb_frame(), t in arb_twist(), v in arb_vector(), u in arb_vector()) {
        let w = Wrench::new(v, u);
        let before = t.dot(&w);
        let after = (f * t).dot(&(f * w));
        prop_assert!((before - after).abs() < 1e-8 * (1.0 + before.abs()));
    }

    #[test]
    fn proptest_frame_diff_then_add_delta(f1 in arb_frame(), f2 in arb_frame(), dt in 0.1..10.0f64) {
        // Half turns have no unique rotation vector
        prop_assume!((f1.m.inverse() * f2.m).rot_angle().0 < PI - 1e-3);
        let t = f1.diff(&f2, dt);
        prop_assert!(abs_diff_eq!(f1.add_delta(&t, dt), f2, epsilon = 1e-7));
    }
}
