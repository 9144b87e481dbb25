use nalgebra::{DMatrix, DVector};
use robot_frames::{Frame, Twist, diff};
use tracing::{debug, trace, warn};

use crate::error::{SolveResult, SolverError, check_size};
use crate::fk::walk;
use crate::ik_vel::TASK_DOF;
use crate::jnt_to_jac::fill_jacobian;
use crate::svd::{SvdHouseholder, SvdKernel};
use crate::{Chain, IkSolverPos, JntArray, Jacobian, Outcome, Solver};

/// QR sweeps the inner decomposition may spend per iteration
const SVD_MAX_ITERATIONS: usize = 150;

/// Initial damping
const TAU: f64 = 10.0;

/// Tuning of [`LmaSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LmaConfig {
    /// Converged once the weighted pose error norm drops below this
    pub eps: f64,
    pub max_iterations: usize,
    /// Lower bound on joint increments and on the error gradient
    pub eps_joints: f64,
    /// Weights of the pose error, translation first
    pub weights: [f64; 6],
}

impl Default for LmaConfig {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            max_iterations: 500,
            eps_joints: 1e-15,
            weights: [1.0, 1.0, 1.0, 0.01, 0.01, 0.01],
        }
    }
}

/// State of the last [`LmaSolver`] solve
///
/// Residuals are unweighted and measured at the returned configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LmaDiagnostics {
    pub iterations: usize,
    pub difference: f64,
    pub trans_diff: f64,
    pub rot_diff: f64,
    /// The largest `min(6, nj)` singular values of the weighted Jacobian,
    /// descending
    pub singular_values: DVector<f64>,
}

impl LmaDiagnostics {
    fn new(nj: usize) -> Self {
        Self {
            iterations: 0,
            difference: 0.0,
            trans_diff: 0.0,
            rot_diff: 0.0,
            singular_values: DVector::zeros(nj.min(TASK_DOF)),
        }
    }
}

/// Levenberg-Marquardt position solver
///
/// Minimizes `‖L e‖²` where `e` is the pose error twist and `L` the
/// diagonal of [`LmaConfig::weights`]. The damping shrinks after every
/// accepted step and grows geometrically after every rejected one.
/// Translation and rotation weights set how much a metre of position error
/// is worth against a radian of orientation error.
#[derive(Clone, Debug)]
pub struct LmaSolver {
    config: LmaConfig,
    nj: usize,
    jac: Jacobian,
    weighted: DMatrix<f64>,
    svd: SvdHouseholder,
    q: JntArray,
    q_new: JntArray,
    aii: DVector<f64>,
    tmp: DVector<f64>,
    diffq: DVector<f64>,
    grad: DVector<f64>,
    delta_pos: DVector<f64>,
    delta_pos_new: DVector<f64>,
    diagnostics: LmaDiagnostics,
}

impl LmaSolver {
    pub fn new(chain: &Chain, config: LmaConfig) -> Self {
        let nj = chain.nr_of_joints();
        Self {
            config,
            nj,
            jac: Jacobian::new(nj),
            weighted: DMatrix::zeros(TASK_DOF, nj),
            svd: SvdHouseholder::new(TASK_DOF, nj),
            q: JntArray::new(nj),
            q_new: JntArray::new(nj),
            aii: DVector::zeros(nj),
            tmp: DVector::zeros(nj),
            diffq: DVector::zeros(nj),
            grad: DVector::zeros(nj),
            delta_pos: DVector::zeros(TASK_DOF),
            delta_pos_new: DVector::zeros(TASK_DOF),
            diagnostics: LmaDiagnostics::new(nj),
        }
    }

    pub fn config(&self) -> &LmaConfig {
        &self.config
    }

    pub fn set_eps(&mut self, eps: f64) {
        self.config.eps = eps;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn set_eps_joints(&mut self, eps_joints: f64) {
        self.config.eps_joints = eps_joints;
    }

    pub fn set_weights(&mut self, weights: [f64; 6]) {
        self.config.weights = weights;
    }

    pub fn diagnostics(&self) -> &LmaDiagnostics {
        &self.diagnostics
    }

    fn weigh_jacobian(&mut self) {
        self.weighted.copy_from(self.jac.as_nalgebra());
        for (r, &w) in self.config.weights.iter().enumerate() {
            self.weighted.row_mut(r).scale_mut(w);
        }
    }

    /// Write the current iterate to `q_out` and snapshot the diagnostics
    fn finish(
        &mut self,
        iterations: usize,
        error: &Twist,
        q_out: &mut JntArray,
        result: SolveResult,
    ) -> SolveResult {
        q_out.as_nalgebra_mut().copy_from(self.q.as_nalgebra());

        let n = self.diagnostics.singular_values.len();
        self.diagnostics.iterations = iterations;
        self.diagnostics.difference = error.norm();
        self.diagnostics.trans_diff = error.vel.norm();
        self.diagnostics.rot_diff = error.rot.norm();
        self.diagnostics
            .singular_values
            .copy_from(&self.svd.singular_values().rows(0, n));

        let code = match &result {
            Ok(outcome) => outcome.code(),
            Err(err) => err.code(),
        };
        debug!(
            iterations,
            difference = self.diagnostics.difference,
            code,
            "Levenberg-Marquardt position solve finished"
        );
        result
    }
}

/// Pose error twist from the chain tip at `q` to `goal`
fn pose_error(chain: &Chain, q: &JntArray, goal: &Frame) -> Twist {
    let pose = walk(chain, q, chain.nr_of_segments(), |_, _| {});
    diff(&pose, goal)
}

fn weigh(weights: &[f64; 6], error: &Twist, out: &mut DVector<f64>) {
    for (i, &w) in weights.iter().enumerate() {
        out[i] = w * error[i];
    }
}

impl Solver for LmaSolver {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        let nj = chain.nr_of_joints();
        self.nj = nj;
        self.jac.resize(nj);
        self.weighted = DMatrix::zeros(TASK_DOF, nj);
        self.svd.resize(TASK_DOF, nj);
        self.q.resize(nj);
        self.q_new.resize(nj);
        self.aii = DVector::zeros(nj);
        self.tmp = DVector::zeros(nj);
        self.diffq = DVector::zeros(nj);
        self.grad = DVector::zeros(nj);
        self.diagnostics = LmaDiagnostics::new(nj);
        debug!(nj, "Levenberg-Marquardt solver resized");
    }

    fn str_error(&self, code: i32) -> &'static str {
        match code {
            -100 => "The gradient of the error towards the joints is too small",
            -101 => "The joint position increments are too small",
            _ => crate::error::describe(code),
        }
    }
}

impl IkSolverPos for LmaSolver {
    fn cart_to_jnt(
        &mut self,
        chain: &Chain,
        q_init: &JntArray,
        p_in: &Frame,
        q_out: &mut JntArray,
    ) -> SolveResult {
        if self.nj != chain.nr_of_joints() {
            return Err(SolverError::NotUpToDate);
        }
        check_size(self.nj, q_init.len())?;
        check_size(self.nj, q_out.len())?;

        let ns = chain.nr_of_segments();
        let weights = self.config.weights;
        let eps_joints = self.config.eps_joints;

        self.q.as_nalgebra_mut().copy_from(q_init.as_nalgebra());
        let mut error = pose_error(chain, &self.q, p_in);
        weigh(&weights, &error, &mut self.delta_pos);
        let mut delta_pos_norm = self.delta_pos.norm();

        fill_jacobian(chain, &self.q, ns, &mut self.jac);
        self.weigh_jacobian();

        if delta_pos_norm < self.config.eps {
            let result = match self.svd.decompose(&self.weighted, SVD_MAX_ITERATIONS) {
                Ok(()) => Ok(Outcome::NoError),
                Err(err) => Err(err.into()),
            };
            return self.finish(0, &error, q_out, result);
        }

        let mut lambda = TAU;
        let mut v = 2.0;
        for iteration in 0..self.config.max_iterations {
            if let Err(err) = self.svd.decompose(&self.weighted, SVD_MAX_ITERATIONS) {
                warn!(%err, iteration, "Levenberg-Marquardt decomposition failed");
                return self.finish(iteration, &error, q_out, Err(err.into()));
            }

            // Damped pseudo-inverse step V diag(σ/(σ²+λ)) Uᵀ e
            let s = self.svd.singular_values();
            for j in 0..self.nj {
                self.aii[j] = s[j] / (s[j] * s[j] + lambda);
            }
            self.tmp.gemv_tr(1.0, self.svd.u(), &self.delta_pos, 0.0);
            self.tmp.component_mul_assign(&self.aii);
            self.diffq.gemv(1.0, self.svd.v(), &self.tmp, 0.0);
            self.grad.gemv_tr(1.0, &self.weighted, &self.delta_pos, 0.0);

            trace!(
                iteration,
                lambda,
                difference = delta_pos_norm,
                q = ?self.q.as_slice(),
                singular_values = ?self.svd.singular_values().as_slice(),
                "Levenberg-Marquardt iteration"
            );

            let dnorm = self.diffq.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
            if dnorm < eps_joints {
                return self.finish(
                    iteration,
                    &error,
                    q_out,
                    Err(SolverError::IncrementJointsTooSmall),
                );
            }
            if self.grad.norm_squared() < eps_joints * eps_joints {
                return self.finish(
                    iteration,
                    &error,
                    q_out,
                    Err(SolverError::GradientJointsTooSmall),
                );
            }

            self.q_new.as_nalgebra_mut().copy_from(self.q.as_nalgebra());
            *self.q_new.as_nalgebra_mut() += &self.diffq;
            let error_new = pose_error(chain, &self.q_new, p_in);
            weigh(&weights, &error_new, &mut self.delta_pos_new);
            let delta_pos_new_norm = self.delta_pos_new.norm();

            let predicted: f64 = self
                .diffq
                .iter()
                .zip(self.grad.iter())
                .map(|(&dq, &g)| dq * (lambda * dq + g))
                .sum();
            let rho = (delta_pos_norm * delta_pos_norm
                - delta_pos_new_norm * delta_pos_new_norm)
                / predicted;

            if rho > 0.0 {
                std::mem::swap(&mut self.q, &mut self.q_new);
                std::mem::swap(&mut self.delta_pos, &mut self.delta_pos_new);
                delta_pos_norm = delta_pos_new_norm;
                error = error_new;
                if delta_pos_norm < self.config.eps {
                    return self.finish(iteration, &error, q_out, Ok(Outcome::NoError));
                }
                fill_jacobian(chain, &self.q, ns, &mut self.jac);
                self.weigh_jacobian();
                let t = 2.0 * rho - 1.0;
                lambda *= (1.0 - t * t * t).max(1.0 / 3.0);
                v = 2.0;
            } else {
                lambda *= v;
                v *= 2.0;
            }
        }

        let max_iterations = self.config.max_iterations;
        self.finish(
            max_iterations,
            &error,
            q_out,
            Err(SolverError::MaxIterationsExceeded),
        )
    }
}
