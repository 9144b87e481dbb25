//! Recursive forward position kinematics.

use robot_frames::Frame;

use crate::error::{SolveResult, SolverError, check_size};
use crate::{Chain, FkSolverPos, JntArray, Outcome, Solver};

/// Evaluates chain poses by composing segment poses from the base outwards
///
/// The solver reads sizes straight from the chain it is given, so it never
/// goes stale and keeps no buffers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecursiveFkSolver;

impl RecursiveFkSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for RecursiveFkSolver {
    fn update_internal_data_structures(&mut self, _chain: &Chain) {}
}

impl FkSolverPos for RecursiveFkSolver {
    fn jnt_to_cart(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut Frame,
        segment_nr: Option<usize>,
    ) -> SolveResult {
        let segment_nr = checked_segment_count(chain, q_in, segment_nr)?;
        *p_out = walk(chain, q_in, segment_nr, |_, _| {});
        Ok(Outcome::NoError)
    }

    fn jnt_to_cart_all(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut [Frame],
        segment_nr: Option<usize>,
    ) -> SolveResult {
        let segment_nr = checked_segment_count(chain, q_in, segment_nr)?;
        check_size(segment_nr, p_out.len())?;
        walk(chain, q_in, segment_nr, |i, pose| p_out[i] = *pose);
        Ok(Outcome::NoError)
    }
}

/// Validate the joint count and resolve the number of segments to evaluate
pub(crate) fn checked_segment_count(
    chain: &Chain,
    q_in: &JntArray,
    segment_nr: Option<usize>,
) -> Result<usize, SolverError> {
    check_size(chain.nr_of_joints(), q_in.len())?;
    let ns = chain.nr_of_segments();
    match segment_nr {
        None => Ok(ns),
        Some(n) if n <= ns => Ok(n),
        Some(n) => Err(SolverError::OutOfRange { index: n, max: ns }),
    }
}

/// Compose the first `segment_nr` segment poses, calling `visit` with the
/// segment index and running pose after each segment
///
/// Fixed segments are evaluated at zero and consume no joint value. Sizes
/// must have been checked by the caller.
pub(crate) fn walk(
    chain: &Chain,
    q_in: &JntArray,
    segment_nr: usize,
    mut visit: impl FnMut(usize, &Frame),
) -> Frame {
    let mut pose = Frame::identity();
    let mut j = 0;
    for (i, segment) in chain.segments()[..segment_nr].iter().enumerate() {
        if segment.joint().is_fixed() {
            pose = pose * segment.pose(0.0);
        } else {
            pose = pose * segment.pose(q_in[j]);
            j += 1;
        }
        visit(i, &pose);
    }
    pose
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlignedJoint, Joint, Segment};
    use approx::assert_abs_diff_eq;
    use robot_frames::{Rotation, Vector};
    use std::f64::consts::FRAC_PI_2;

    fn planar_two_link() -> Chain {
        let mut chain = Chain::new();
        for name in ["upper", "lower"] {
            chain.add_segment(Segment::new(
                name,
                Joint::aligned(name, AlignedJoint::RotZ),
                Frame::from_translation(Vector::new(1.0, 0.0, 0.0)),
            ));
        }
        chain
    }

    #[test]
    fn test_planar_pose() {
        let chain = planar_two_link();
        let fk = RecursiveFkSolver::new();
        let q = JntArray::from_slice(&[FRAC_PI_2, -FRAC_PI_2]);
        let mut pose = Frame::identity();

        fk.jnt_to_cart(&chain, &q, &mut pose, None).unwrap();
        assert_abs_diff_eq!(pose.p, Vector::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(pose.m, Rotation::identity(), epsilon = 1e-12);

        fk.jnt_to_cart(&chain, &q, &mut pose, Some(1)).unwrap();
        assert_abs_diff_eq!(pose.p, Vector::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        fk.jnt_to_cart(&chain, &q, &mut pose, Some(0)).unwrap();
        assert_eq!(pose, Frame::identity());
    }

    #[test]
    fn test_all_poses_match_truncated_poses() {
        let mut chain = planar_two_link();
        chain.add_segment(Segment::new(
            "tool",
            Joint::fixed("flange"),
            Frame::from_translation(Vector::new(0.0, 0.0, 0.2)),
        ));
        let fk = RecursiveFkSolver::new();
        let q = JntArray::from_slice(&[0.3, 0.4]);

        let mut poses = vec![Frame::identity(); 3];
        fk.jnt_to_cart_all(&chain, &q, &mut poses, None).unwrap();
        for (i, expected) in poses.iter().enumerate() {
            let mut pose = Frame::identity();
            fk.jnt_to_cart(&chain, &q, &mut pose, Some(i + 1)).unwrap();
            assert_eq!(&pose, expected);
        }
        assert_abs_diff_eq!(poses[2].p.z(), 0.2, epsilon = 1e-15);
    }

    #[test]
    fn test_size_errors_leave_output_untouched() {
        let chain = planar_two_link();
        let fk = RecursiveFkSolver::new();
        let marker = Frame::from_translation(Vector::new(9.0, 9.0, 9.0));

        let mut pose = marker;
        let result = fk.jnt_to_cart(&chain, &JntArray::new(3), &mut pose, None);
        assert!(matches!(result, Err(SolverError::SizeMismatch { expected: 2, actual: 3 })));
        assert_eq!(pose, marker);

        let result = fk.jnt_to_cart(&chain, &JntArray::new(2), &mut pose, Some(3));
        assert!(matches!(result, Err(SolverError::OutOfRange { index: 3, max: 2 })));
        assert_eq!(pose, marker);

        let mut poses = vec![marker; 1];
        let result = fk.jnt_to_cart_all(&chain, &JntArray::new(2), &mut poses, None);
        assert!(matches!(result, Err(SolverError::SizeMismatch { .. })));
        assert_eq!(poses[0], marker);
    }
}
