//! Solver error protocol shared by every solver.
//!
//! Codes follow one convention: zero means no error, positive codes mark a
//! degraded but usable solution and negative codes mark a failure. Codes
//! within +-100 belong to the base taxonomy; individual solvers add their
//! own outside that range and describe them through
//! [`Solver::str_error`](crate::Solver::str_error).

use std::fmt;

use crate::svd::SvdError;

/// Result of a solve call: the success outcome or the failure
pub type SolveResult = std::result::Result<Outcome, SolverError>;

/// Non-negative result codes of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Solution within tolerance
    NoError,
    /// Converged, but the solution is degraded
    Degraded,
    /// Pseudo-inverse went through a genuine singularity
    PinvSingular,
}

impl Outcome {
    pub fn code(&self) -> i32 {
        match self {
            Outcome::NoError => 0,
            Outcome::Degraded => 1,
            Outcome::PinvSingular => 100,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Outcome::PinvSingular => PINV_SINGULAR_DESCRIPTION,
            other => describe(other.code()),
        }
    }

    /// Whether the motion may proceed without further checks
    pub fn is_clean(&self) -> bool {
        matches!(self, Outcome::NoError)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

pub(crate) const PINV_SINGULAR_DESCRIPTION: &str =
    "Converged but the pseudo-inverse of the Jacobian is singular";

/// Failure codes of a solve
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Failed to converge")]
    NoConverge,

    #[error("Undefined value")]
    Undefined,

    /// The chain changed size since the solver last resynchronised
    #[error("Internal data structures not up to date with Chain")]
    NotUpToDate,

    #[error("The size of the input does not match the internal state: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("The maximum number of iterations is exceeded")]
    MaxIterationsExceeded,

    #[error("The requested index is out of range: {index} > {max}")]
    OutOfRange { index: usize, max: usize },

    #[error("The requested function is not yet implemented")]
    NotImplemented,

    #[error("SVD failed")]
    SvdFailed(#[from] SvdError),

    /// The velocity solver inside a position solver failed
    #[error("Child IK velocity solver failed")]
    IkSolverVelFailed(#[source] Box<SolverError>),

    /// The forward solver inside a position solver failed
    #[error("Child FK position solver failed")]
    FkSolverPosFailed(#[source] Box<SolverError>),

    #[error("The gradient of the error towards the joints is too small")]
    GradientJointsTooSmall,

    #[error("The joint position increments are too small")]
    IncrementJointsTooSmall,
}

impl SolverError {
    pub fn code(&self) -> i32 {
        match self {
            SolverError::NoConverge => -1,
            SolverError::Undefined => -2,
            SolverError::NotUpToDate => -3,
            SolverError::SizeMismatch { .. } => -4,
            SolverError::MaxIterationsExceeded => -5,
            SolverError::OutOfRange { .. } => -6,
            SolverError::NotImplemented => -7,
            SolverError::SvdFailed(_) => -8,
            SolverError::IkSolverVelFailed(_) => -100,
            SolverError::FkSolverPosFailed(_) => -101,
            SolverError::GradientJointsTooSmall => -100,
            SolverError::IncrementJointsTooSmall => -101,
        }
    }

    pub(crate) fn size_mismatch(expected: usize, actual: usize) -> Self {
        SolverError::SizeMismatch { expected, actual }
    }
}

/// Description of a base taxonomy code
///
/// Codes outside the base taxonomy give `"UNKNOWN ERROR"`.
///
/// # Example
/// ```rust
/// use robot_kinematics::error::describe;
///
/// assert_eq!(describe(-8), "SVD failed");
/// assert_eq!(describe(-42), "UNKNOWN ERROR");
/// ```
pub fn describe(code: i32) -> &'static str {
    match code {
        1 => "Converged but degraded solution",
        0 => "No error",
        -1 => "Failed to converge",
        -2 => "Undefined value",
        -3 => "Internal data structures not up to date with Chain",
        -4 => "The size of the input does not match the internal state",
        -5 => "The maximum number of iterations is exceeded",
        -6 => "The requested index is out of range",
        -7 => "The requested function is not yet implemented",
        -8 => "SVD failed",
        _ => "UNKNOWN ERROR",
    }
}

/// Check a length against the expected one
pub(crate) fn check_size(expected: usize, actual: usize) -> Result<(), SolverError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SolverError::size_mismatch(expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_codes_follow_sign_convention() {
        assert_eq!(Outcome::NoError.code(), 0);
        assert!(Outcome::Degraded.code() > 0);
        assert!(Outcome::PinvSingular.code() > 0);

        let failures = [
            SolverError::NoConverge,
            SolverError::Undefined,
            SolverError::NotUpToDate,
            SolverError::size_mismatch(3, 2),
            SolverError::MaxIterationsExceeded,
            SolverError::OutOfRange { index: 4, max: 3 },
            SolverError::NotImplemented,
            SolverError::SvdFailed(SvdError::NoConvergence { max_iterations: 1 }),
            SolverError::GradientJointsTooSmall,
            SolverError::IncrementJointsTooSmall,
        ];
        for (err, code) in failures.iter().zip([-1, -2, -3, -4, -5, -6, -7, -8, -100, -101]) {
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn test_describe_base_codes() {
        for code in -8..=1 {
            assert_ne!(describe(code), "UNKNOWN ERROR");
        }
        assert_eq!(describe(-3), SolverError::NotUpToDate.to_string());
        assert_eq!(describe(100), "UNKNOWN ERROR");
        assert_eq!(describe(-100), "UNKNOWN ERROR");
    }

    #[test]
    fn test_outcome_description() {
        assert_eq!(Outcome::NoError.to_string(), "No error");
        assert_eq!(Outcome::PinvSingular.description(), PINV_SINGULAR_DESCRIPTION);
        assert!(Outcome::NoError.is_clean());
        assert!(!Outcome::Degraded.is_clean());
    }

    #[test]
    fn test_child_failure_keeps_source() {
        let err = SolverError::IkSolverVelFailed(Box::new(SolverError::size_mismatch(6, 5)));
        assert_eq!(err.code(), -100);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("The size of the input does not match the internal state: expected 6, got 5")
        );
    }

    #[test]
    fn test_svd_error_converts() {
        let err: SolverError = SvdError::NoConvergence { max_iterations: 150 }.into();
        assert_eq!(err.code(), -8);
        assert!(err.source().is_some());
    }
}
