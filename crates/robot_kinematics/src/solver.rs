//! The solver interfaces.
//!
//! Solvers never hold on to a chain; every call receives it. A solver sizes
//! its working buffers for one chain shape and rejects calls for a chain of
//! a different shape with [`SolverError::NotUpToDate`] until
//! [`Solver::update_internal_data_structures`] has run again.
//!
//! [`SolverError::NotUpToDate`]: crate::SolverError::NotUpToDate

use robot_frames::{Frame, Twist};

use crate::error::{SolveResult, describe};
use crate::{Chain, JntArray};

/// Behaviour shared by every solver
pub trait Solver {
    /// Re-read joint and segment counts from `chain` and resize every working
    /// buffer
    fn update_internal_data_structures(&mut self, chain: &Chain);

    /// Description of a result code, including the solver's own ones
    fn str_error(&self, code: i32) -> &'static str {
        describe(code)
    }
}

/// Forward position kinematics
pub trait FkSolverPos: Solver {
    /// Pose of the tip of segment `segment_nr - 1` relative to the chain base
    ///
    /// `None` evaluates the whole chain; `Some(0)` gives the identity.
    fn jnt_to_cart(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut Frame,
        segment_nr: Option<usize>,
    ) -> SolveResult;

    /// Pose of every segment tip up to `segment_nr`
    ///
    /// `p_out` needs exactly one entry per evaluated segment.
    fn jnt_to_cart_all(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut [Frame],
        segment_nr: Option<usize>,
    ) -> SolveResult;
}

/// Inverse velocity kinematics
pub trait IkSolverVel: Solver {
    /// Joint velocities that produce the twist `v_in` at configuration `q_in`
    fn cart_to_jnt(
        &mut self,
        chain: &Chain,
        q_in: &JntArray,
        v_in: &Twist,
        qdot_out: &mut JntArray,
    ) -> SolveResult;
}

/// Inverse position kinematics
pub trait IkSolverPos: Solver {
    /// Joint positions that place the chain tip at `p_in`, searched from
    /// `q_init`
    fn cart_to_jnt(
        &mut self,
        chain: &Chain,
        q_init: &JntArray,
        p_in: &Frame,
        q_out: &mut JntArray,
    ) -> SolveResult;
}

impl<T: Solver + ?Sized> Solver for &mut T {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        (**self).update_internal_data_structures(chain)
    }

    fn str_error(&self, code: i32) -> &'static str {
        (**self).str_error(code)
    }
}

impl<T: FkSolverPos + ?Sized> FkSolverPos for &mut T {
    fn jnt_to_cart(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut Frame,
        segment_nr: Option<usize>,
    ) -> SolveResult {
        (**self).jnt_to_cart(chain, q_in, p_out, segment_nr)
    }

    fn jnt_to_cart_all(
        &self,
        chain: &Chain,
        q_in: &JntArray,
        p_out: &mut [Frame],
        segment_nr: Option<usize>,
    ) -> SolveResult {
        (**self).jnt_to_cart_all(chain, q_in, p_out, segment_nr)
    }
}

impl<T: IkSolverVel + ?Sized> IkSolverVel for &mut T {
    fn cart_to_jnt(
        &mut self,
        chain: &Chain,
        q_in: &JntArray,
        v_in: &Twist,
        qdot_out: &mut JntArray,
    ) -> SolveResult {
        (**self).cart_to_jnt(chain, q_in, v_in, qdot_out)
    }
}
