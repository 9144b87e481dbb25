//! # Robot Kinematics
//!
//! Serial kinematic chains and the iterative solvers that move between
//! joint space and Cartesian space. Geometry comes from [`robot_frames`].
//!
//! ## Features
//!
//! - [`Joint`], [`Segment`] and [`Chain`] describing an open chain
//! - Forward position kinematics ([`RecursiveFkSolver`]) and the geometric
//!   Jacobian ([`JacobianSolver`])
//! - Three SVD kernels in [`svd`], sized once and reused in place
//! - Velocity IK: pseudo-inverse, weighted damped least squares, nullspace
//!   optimization and a warm-started Jacobi pseudo-inverse
//! - Position IK: Newton-Raphson with joint limits and Levenberg-Marquardt
//!
//! Solvers never own the chain. They size their buffers for a chain shape
//! when built and take the chain on every call; see [`Solver`].
//!
//! ## Example
//!
//! ```rust
//! use approx::assert_abs_diff_eq;
//! use robot_frames::{Frame, Vector};
//! use robot_kinematics::{AlignedJoint, Chain, FkSolverPos, JntArray, Joint, RecursiveFkSolver, Segment};
//!
//! let mut chain = Chain::new();
//! for name in ["upper", "lower"] {
//!     chain.add_segment(Segment::new(
//!         name,
//!         Joint::aligned(name, AlignedJoint::RotZ),
//!         Frame::from_translation(Vector::new(1.0, 0.0, 0.0)),
//!     ));
//! }
//!
//! let mut pose = Frame::identity();
//! RecursiveFkSolver::new()
//!     .jnt_to_cart(&chain, &JntArray::new(2), &mut pose, None)
//!     .unwrap();
//! assert_abs_diff_eq!(pose.p, Vector::new(2.0, 0.0, 0.0), epsilon = 1e-12);
//! ```

pub mod chain;
pub mod error;
pub mod fk;
pub mod ik_pos;
pub mod ik_vel;
pub mod jacobian;
pub mod jnt_to_jac;
pub mod jntarray;
pub mod joint;
pub mod segment;
pub mod solver;
pub mod svd;

pub use chain::Chain;
pub use error::{Outcome, SolveResult, SolverError, describe};
pub use fk::RecursiveFkSolver;
pub use ik_pos::{LmaConfig, LmaDiagnostics, LmaSolver, NrJlConfig, NrJlSolver};
pub use ik_vel::{
    NsoConfig, NsoSolver, PinvConfig, PinvGivensConfig, PinvGivensSolver, PinvSolver, WdlsConfig,
    WdlsSolver,
};
pub use jacobian::Jacobian;
pub use jnt_to_jac::JacobianSolver;
pub use jntarray::JntArray;
pub use joint::{AlignedJoint, Joint, JointType};
pub use robot_frames;
pub use segment::Segment;
pub use solver::{FkSolverPos, IkSolverPos, IkSolverVel, Solver};
