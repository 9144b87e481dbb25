//! # Robot Frames
//!
//! Rigid-body geometry for kinematic chains: free vectors, proper rotations,
//! rigid transforms and the 6D velocity/force pair types that move between
//! them.
//!
//! ## Features
//!
//! - [`Vector`], [`Rotation`] and [`Frame`] with matrix-style composition
//! - [`Twist`] and [`Wrench`] with reference-point shifting
//! - [`Delta`] for finite differences (`diff`) and integration (`add_delta`)
//! - Tolerance comparison through the `approx` traits
//! - Conversions to and from nalgebra types
//!
//! ## Example
//!
//! ```rust
//! use robot_frames::{Frame, Rotation, Vector};
//! use approx::assert_abs_diff_eq;
//!
//! let f = Frame::new(Rotation::rot_z(0.3), Vector::new(1.0, 2.0, 3.0));
//! assert_abs_diff_eq!(f.inverse() * f, Frame::identity(), epsilon = 1e-12);
//! ```

pub mod delta;
pub mod frame;
pub mod rotation;
pub mod twist;
pub mod vector;
pub mod wrench;

pub use delta::{Delta, diff};
pub use frame::Frame;
pub use rotation::Rotation;
pub use twist::Twist;
pub use vector::Vector;
pub use wrench::Wrench;

/// Default tolerance used for approximate comparisons and for detecting
/// degenerate rotations.
pub const EPSILON: f64 = 1e-6;

/// Common result type for this library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for geometric operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The operation has no defined result for its input
    #[error("Undefined value: {message}")]
    Undefined { message: &'static str },
}
