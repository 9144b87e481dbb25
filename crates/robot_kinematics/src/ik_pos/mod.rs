//! Inverse position kinematics.
//!
//! [`NrJlSolver`] iterates a forward solver and a velocity solver of the
//! caller's choice; [`LmaSolver`] is self-contained and minimizes a
//! weighted pose error with Levenberg-Marquardt steps.

mod lma;
mod nr_jl;

pub use lma::{LmaConfig, LmaDiagnostics, LmaSolver};
pub use nr_jl::{NrJlConfig, NrJlSolver};
