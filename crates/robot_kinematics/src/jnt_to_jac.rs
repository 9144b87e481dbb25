//! Geometric Jacobian of a chain.

use robot_frames::Frame;

use crate::error::{SolveResult, SolverError, check_size};
use crate::fk::{checked_segment_count, walk};
use crate::{Chain, JntArray, Jacobian, Outcome, Solver};

/// Builds the Jacobian of a chain, referenced at the tip and expressed in
/// base coordinates
#[derive(Clone, Debug)]
pub struct JacobianSolver {
    nj: usize,
}

impl JacobianSolver {
    pub fn new(chain: &Chain) -> Self {
        Self {
            nj: chain.nr_of_joints(),
        }
    }

    /// Fill `jac` for configuration `q_in`
    ///
    /// With `segment_nr` only the first segments are considered and the
    /// columns are referenced at the tip of the last of them; columns of
    /// joints past that segment are zero.
    pub fn jnt_to_jac(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        jac: &mut Jacobian,
        segment_nr: Option<usize>,
    ) -> SolveResult {
        if self.nj != chain.nr_of_joints() {
            return Err(SolverError::NotUpToDate);
        }
        let segment_nr = checked_segment_count(chain, q_in, segment_nr)?;
        check_size(self.nj, jac.columns())?;
        fill_jacobian(chain, q_in, segment_nr, jac);
        Ok(Outcome::NoError)
    }
}

impl Solver for JacobianSolver {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        self.nj = chain.nr_of_joints();
    }
}

/// Write the Jacobian of the first `segment_nr` segments into `jac` and
/// return the pose of the last of them
///
/// Sizes must have been checked by the caller.
pub(crate) fn fill_jacobian(
    chain: &Chain,
    q_in: &JntArray,
    segment_nr: usize,
    jac: &mut Jacobian,
) -> Frame {
    jac.set_to_zero();
    let end = walk(chain, q_in, segment_nr, |_, _| {});

    let mut root = Frame::identity();
    let mut j = 0;
    for segment in &chain.segments()[..segment_nr] {
        if segment.joint().is_fixed() {
            root = root * segment.pose(0.0);
            continue;
        }
        let q = q_in[j];
        let tip = root * segment.pose(q);
        let column = (root.m * segment.twist(q, 1.0)).ref_point(end.p - tip.p);
        jac.set_column(j, &column);
        root = tip;
        j += 1;
    }
    end
}
