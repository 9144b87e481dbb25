use nalgebra::{DMatrix, DVector};
use robot_frames::Twist;
use tracing::{debug, warn};

use super::{TASK_DOF, describe_pinv, resize_keeping_identity, truncation_outcome};
use crate::error::{SolveResult, SolverError, check_size};
use crate::svd::{SvdError, SvdHouseholder, SvdKernel};
use crate::{Chain, IkSolverVel, JacobianSolver, JntArray, Jacobian, Solver};

/// Tuning of [`WdlsSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WdlsConfig {
    /// Singular values below this are damped instead of inverted
    pub eps: f64,
    /// Iteration cap of the SVD
    pub max_iterations: usize,
    /// Damping applied at an exact singularity
    pub lambda: f64,
}

impl Default for WdlsConfig {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            max_iterations: 150,
            lambda: 0.0,
        }
    }
}

/// Weighted damped least squares inverse velocity kinematics
///
/// The Jacobian is weighted as `W_ts J W_js` before it is decomposed. The
/// joint-space weight `W_js` shapes which joints take up the motion (with
/// `W_js = diag(1/sqrt(w))` joints with a large `w` move less) and the
/// task-space weight `W_ts` trades off errors between twist components.
///
/// Damping grows smoothly as the sixth singular value drops below `eps`:
/// `lambda_scaled = lambda sqrt(1 - (sigma_min / eps)²)`, and small singular
/// values are inverted as `sigma / (sigma² + lambda_scaled²)`.
#[derive(Clone, Debug)]
pub struct WdlsSolver<K: SvdKernel = SvdHouseholder> {
    config: WdlsConfig,
    nj: usize,
    jnt_to_jac: JacobianSolver,
    jac: Jacobian,
    svd: K,
    jac_js: DMatrix<f64>,
    jac_weighted: DMatrix<f64>,
    tmp: DVector<f64>,
    tmp_ts: DMatrix<f64>,
    tmp_js: DMatrix<f64>,
    weight_ts: DMatrix<f64>,
    weight_js: DMatrix<f64>,
    lambda_scaled: f64,
    sigma_min: f64,
    nr_zero_sigmas: usize,
    svd_result: Result<(), SvdError>,
}

impl WdlsSolver<SvdHouseholder> {
    pub fn new(chain: &Chain, config: WdlsConfig) -> Self {
        Self::with_kernel(chain, config)
    }
}

impl<K: SvdKernel> WdlsSolver<K> {
    pub fn with_kernel(chain: &Chain, config: WdlsConfig) -> Self {
        let nj = chain.nr_of_joints();
        Self {
            config,
            nj,
            jnt_to_jac: JacobianSolver::new(chain),
            jac: Jacobian::new(nj),
            svd: K::with_size(TASK_DOF, nj),
            jac_js: DMatrix::zeros(TASK_DOF, nj),
            jac_weighted: DMatrix::zeros(TASK_DOF, nj),
            tmp: DVector::zeros(nj),
            tmp_ts: DMatrix::zeros(TASK_DOF, nj.min(TASK_DOF)),
            tmp_js: DMatrix::zeros(nj, nj),
            weight_ts: DMatrix::identity(TASK_DOF, TASK_DOF),
            weight_js: DMatrix::identity(nj, nj),
            lambda_scaled: 0.0,
            sigma_min: 0.0,
            nr_zero_sigmas: 0,
            svd_result: Ok(()),
        }
    }

    pub fn config(&self) -> &WdlsConfig {
        &self.config
    }

    /// Set the `nj x nj` joint-space weight
    pub fn set_weight_js(&mut self, weight: &DMatrix<f64>) -> Result<(), SolverError> {
        check_size(self.nj * self.nj, weight.len())?;
        check_size(self.nj, weight.nrows())?;
        self.weight_js.copy_from(weight);
        Ok(())
    }

    /// Set the `6 x 6` task-space weight
    pub fn set_weight_ts(&mut self, weight: &DMatrix<f64>) -> Result<(), SolverError> {
        check_size(TASK_DOF * TASK_DOF, weight.len())?;
        check_size(TASK_DOF, weight.nrows())?;
        self.weight_ts.copy_from(weight);
        Ok(())
    }

    pub fn set_lambda(&mut self, lambda: f64) {
        self.config.lambda = lambda;
    }

    pub fn set_eps(&mut self, eps: f64) {
        self.config.eps = eps;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    /// Singular values of the weighted Jacobian from the last solve
    pub fn sigma(&self) -> &DVector<f64> {
        self.svd.singular_values()
    }

    pub fn lambda_scaled(&self) -> f64 {
        self.lambda_scaled
    }

    /// Sixth singular value of the last solve, zero for short chains
    pub fn sigma_min(&self) -> f64 {
        self.sigma_min
    }

    pub fn nr_zero_sigmas(&self) -> usize {
        self.nr_zero_sigmas
    }

    pub fn svd_result(&self) -> Result<(), &SvdError> {
        self.svd_result.as_ref().map(|_| ())
    }
}

impl<K: SvdKernel> Solver for WdlsSolver<K> {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        let nj = chain.nr_of_joints();
        self.nj = nj;
        self.jnt_to_jac.update_internal_data_structures(chain);
        self.jac.resize(nj);
        self.svd.resize(TASK_DOF, nj);
        self.jac_js = DMatrix::zeros(TASK_DOF, nj);
        self.jac_weighted = DMatrix::zeros(TASK_DOF, nj);
        self.tmp = DVector::zeros(nj);
        self.tmp_ts = DMatrix::zeros(TASK_DOF, nj.min(TASK_DOF));
        self.tmp_js = DMatrix::zeros(nj, nj);
        self.weight_js = resize_keeping_identity(&self.weight_js, nj);
        debug!(nj, "weighted damped least squares solver resized");
    }

    fn str_error(&self, code: i32) -> &'static str {
        describe_pinv(code)
    }
}

impl<K: SvdKernel> IkSolverVel for WdlsSolver<K> {
    fn cart_to_jnt(
        &mut self,
        chain: &Chain,
        q_in: &JntArray,
        v_in: &Twist,
        qdot_out: &mut JntArray,
    ) -> SolveResult {
        if self.nj != chain.nr_of_joints() {
            return Err(SolverError::NotUpToDate);
        }
        check_size(self.nj, q_in.len())?;
        check_size(self.nj, qdot_out.len())?;
        self.jnt_to_jac.jnt_to_jac(chain, q_in, &mut self.jac, None)?;

        self.nr_zero_sigmas = 0;
        self.sigma_min = 0.0;
        self.lambda_scaled = 0.0;

        // W_ts J W_js
        self.jac_js
            .gemm(1.0, self.jac.as_nalgebra(), &self.weight_js, 0.0);
        self.jac_weighted
            .gemm(1.0, &self.weight_ts, &self.jac_js, 0.0);
        self.svd_result = self
            .svd
            .decompose(&self.jac_weighted, self.config.max_iterations);
        if let Err(err) = &self.svd_result {
            warn!(%err, "weighted Jacobian decomposition failed");
            qdot_out.set_to_zero();
            return Err(err.clone().into());
        }

        let u = self.svd.u();
        let s = self.svd.singular_values();
        let task_columns = self.tmp_ts.ncols();
        self.tmp_ts
            .gemm(1.0, &self.weight_ts, &u.columns(0, task_columns), 0.0);
        self.tmp_js.gemm(1.0, &self.weight_js, self.svd.v(), 0.0);

        let WdlsConfig { eps, lambda, .. } = self.config;
        if self.nj >= TASK_DOF {
            self.sigma_min = s[TASK_DOF - 1];
        }
        if self.sigma_min < eps {
            let ratio = self.sigma_min / eps;
            self.lambda_scaled = (1.0 - ratio * ratio).sqrt() * lambda;
        }

        for i in 0..self.nj {
            let sum = if i < TASK_DOF {
                (0..TASK_DOF).map(|j| self.tmp_ts[(j, i)] * v_in[j]).sum::<f64>()
            } else {
                0.0
            };
            self.tmp[i] = if s[i].abs() < eps {
                self.nr_zero_sigmas += 1;
                let denominator = s[i] * s[i] + self.lambda_scaled * self.lambda_scaled;
                // Singular values past the sixth are structurally zero
                if i < TASK_DOF && denominator > 0.0 {
                    sum * s[i] / denominator
                } else {
                    0.0
                }
            } else {
                sum / s[i]
            };
        }
        qdot_out
            .as_nalgebra_mut()
            .gemv(1.0, &self.tmp_js, &self.tmp, 0.0);

        Ok(truncation_outcome(self.nr_zero_sigmas, self.nj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik_vel::test_support::*;
    use crate::{Outcome, PinvConfig, PinvSolver};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_undamped_matches_pinv_away_from_singularities() {
        let chain = six_dof_arm();
        let q = generic_configuration(6);
        let twist = Twist::from([0.2, 0.0, -0.1, 0.0, 0.3, 0.1]);

        let mut wdls = WdlsSolver::new(&chain, WdlsConfig::default());
        let mut pinv = PinvSolver::new(&chain, PinvConfig::default());
        let mut qdot_wdls = JntArray::new(6);
        let mut qdot_pinv = JntArray::new(6);
        assert_eq!(
            wdls.cart_to_jnt(&chain, &q, &twist, &mut qdot_wdls).unwrap(),
            Outcome::NoError
        );
        pinv.cart_to_jnt(&chain, &q, &twist, &mut qdot_pinv).unwrap();
        assert_abs_diff_eq!(
            qdot_wdls.as_nalgebra(),
            qdot_pinv.as_nalgebra(),
            epsilon = 1e-9
        );
        assert_eq!(wdls.lambda_scaled(), 0.0);
        assert!(wdls.sigma_min() >= wdls.config().eps);
        assert_eq!(wdls.sigma().len(), 6);
    }

    #[test]
    fn test_damping_near_singularity() {
        let chain = six_dof_arm();
        let mut solver = WdlsSolver::new(&chain, WdlsConfig::default());
        solver.set_lambda(0.5);
        solver.set_eps(0.1);
        let mut q = JntArray::new(6);
        q[2] = 1e-3;
        q[4] = 1e-3;
        let mut qdot = JntArray::new(6);
        let outcome = solver
            .cart_to_jnt(&chain, &q, &Twist::from([0.0, 0.1, 0.0, 0.0, 0.0, 0.0]), &mut qdot)
            .unwrap();

        assert_eq!(outcome, Outcome::PinvSingular);
        assert!(solver.sigma_min() < 0.1);
        assert!(solver.lambda_scaled() > 0.0);
        assert!(solver.lambda_scaled() <= 0.5);
        assert!(solver.nr_zero_sigmas() >= 1);
        assert!(qdot.as_slice().iter().all(|x| x.is_finite() && x.abs() < 10.0));
    }

    #[test]
    fn test_joint_weight_shifts_motion() {
        let chain = seven_dof_arm();
        let q = generic_configuration(7);
        let twist = Twist::from([0.0, 0.1, 0.0, 0.0, 0.0, 0.0]);

        let mut solver = WdlsSolver::new(&chain, WdlsConfig::default());
        let mut free = JntArray::new(7);
        solver.cart_to_jnt(&chain, &q, &twist, &mut free).unwrap();

        let mut weight = DMatrix::identity(7, 7);
        weight[(0, 0)] = 0.01;
        solver.set_weight_js(&weight).unwrap();
        let mut held = JntArray::new(7);
        solver.cart_to_jnt(&chain, &q, &twist, &mut held).unwrap();

        assert!(held[0].abs() < free[0].abs());
        // Weighting keeps the task exact on a redundant arm
        assert_abs_diff_eq!(jacobian_times(&chain, &q, &held), twist, epsilon = 1e-8);
    }

    #[test]
    fn test_weight_sizes_are_checked() {
        let chain = planar_two_link();
        let mut solver = WdlsSolver::new(&chain, WdlsConfig::default());
        assert!(matches!(
            solver.set_weight_js(&DMatrix::identity(3, 3)),
            Err(SolverError::SizeMismatch { .. })
        ));
        assert!(matches!(
            solver.set_weight_ts(&DMatrix::identity(5, 5)),
            Err(SolverError::SizeMismatch { .. })
        ));
        assert!(solver.set_weight_ts(&DMatrix::identity(6, 6)).is_ok());
        assert!(solver.set_weight_js(&DMatrix::identity(2, 2)).is_ok());
    }

    #[test]
    fn test_resize_keeps_joint_weights() {
        let mut chain = planar_two_link();
        let mut solver = WdlsSolver::new(&chain, WdlsConfig::default());
        let mut weight = DMatrix::identity(2, 2);
        weight[(1, 1)] = 4.0;
        solver.set_weight_js(&weight).unwrap();

        chain.add_chain(&planar_two_link());
        solver.update_internal_data_structures(&chain);
        let mut qdot = JntArray::new(4);
        let q = generic_configuration(4);
        assert!(solver.cart_to_jnt(&chain, &q, &Twist::zero(), &mut qdot).is_ok());
        assert_eq!(solver.weight_js[(1, 1)], 4.0);
        assert_eq!(solver.weight_js[(3, 3)], 1.0);
    }
}
