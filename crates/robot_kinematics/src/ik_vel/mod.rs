//! Inverse velocity kinematics.
//!
//! Every solver maps a desired tip twist to joint velocities through a
//! pseudo-inverse of the chain's Jacobian. They differ in how they treat
//! small singular values and what they do with the nullspace.

mod nso;
mod pinv;
mod pinv_givens;
mod wdls;

pub use nso::{NsoConfig, NsoSolver};
pub use pinv::{PinvConfig, PinvSolver};
pub use pinv_givens::{PinvGivensConfig, PinvGivensSolver};
pub use wdls::{WdlsConfig, WdlsSolver};

use nalgebra::DMatrix;
use robot_frames::Twist;

use crate::Outcome;
use crate::error::{PINV_SINGULAR_DESCRIPTION, describe};

/// Number of Cartesian degrees of freedom, the row count of a Jacobian
pub(crate) const TASK_DOF: usize = 6;

/// Flag a solution as singular when more singular values were truncated
/// than the chain's structural nullspace explains
///
/// Chains with fewer than six joints have no structural nullspace, so any
/// truncated value counts there.
fn truncation_outcome(zero_sigmas: usize, nj: usize) -> Outcome {
    if zero_sigmas > nj.saturating_sub(TASK_DOF) {
        Outcome::PinvSingular
    } else {
        Outcome::NoError
    }
}

/// Description lookup for the solvers that report
/// [`Outcome::PinvSingular`]
fn describe_pinv(code: i32) -> &'static str {
    if code == Outcome::PinvSingular.code() {
        PINV_SINGULAR_DESCRIPTION
    } else {
        describe(code)
    }
}

/// Entry `i` of `Uᵀ v`
fn project_twist(u: &DMatrix<f64>, v_in: &Twist, i: usize) -> f64 {
    (0..TASK_DOF).map(|j| u[(j, i)] * v_in[j]).sum()
}

/// Keep the overlapping top-left block of `old` in a new `n x n` identity
fn resize_keeping_identity(old: &DMatrix<f64>, n: usize) -> DMatrix<f64> {
    let mut resized = DMatrix::identity(n, n);
    let keep = n.min(old.nrows()).min(old.ncols());
    resized
        .view_mut((0, 0), (keep, keep))
        .copy_from(&old.view((0, 0), (keep, keep)));
    resized
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_outcome() {
        assert_eq!(truncation_outcome(0, 6), Outcome::NoError);
        assert_eq!(truncation_outcome(1, 6), Outcome::PinvSingular);
        assert_eq!(truncation_outcome(1, 7), Outcome::NoError);
        assert_eq!(truncation_outcome(2, 7), Outcome::PinvSingular);
        // Short chains have no structural nullspace to hide behind
        assert_eq!(truncation_outcome(0, 2), Outcome::NoError);
        assert_eq!(truncation_outcome(1, 2), Outcome::PinvSingular);
    }

    #[test]
    fn test_resize_keeping_identity() {
        let old = DMatrix::from_element(2, 2, 3.0);
        let grown = resize_keeping_identity(&old, 3);
        assert_eq!(grown[(1, 1)], 3.0);
        assert_eq!(grown[(0, 1)], 3.0);
        assert_eq!(grown[(2, 2)], 1.0);
        assert_eq!(grown[(2, 0)], 0.0);
        let shrunk = resize_keeping_identity(&grown, 1);
        assert_eq!(shrunk, DMatrix::from_element(1, 1, 3.0));
    }

    #[test]
    fn test_describe_pinv() {
        assert_eq!(describe_pinv(100), PINV_SINGULAR_DESCRIPTION);
        assert_eq!(describe_pinv(-4), describe(-4));
    }
}
