use nalgebra::DVector;
use robot_frames::Twist;
use tracing::{debug, warn};

use super::TASK_DOF;
use crate::error::{SolveResult, SolverError, check_size};
use crate::svd::{SvdError, SvdHouseholder, SvdKernel};
use crate::{Chain, IkSolverVel, JacobianSolver, JntArray, Jacobian, Outcome, Solver};

/// Posture cost normalizers below this skip the nullspace term
const MIN_POSTURE_NORM: f64 = 1e-9;

/// Tuning of [`NsoSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NsoConfig {
    pub eps: f64,
    pub max_iterations: usize,
    /// Gain of the posture term
    pub alpha: f64,
}

impl Default for NsoConfig {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            max_iterations: 150,
            alpha: 0.25,
        }
    }
}

/// Pseudo-inverse solver that spends the Jacobian's nullspace on pulling
/// the joints towards a preferred posture
///
/// The posture cost is `g(q) = ½ Σ wᵢ (qᵢ - q_optᵢ)²`. Its steepest descent
/// step is projected through `I - J⁺J` and added to the primary solution,
/// so it only moves joints in directions that leave the tip twist alone.
#[derive(Clone, Debug)]
pub struct NsoSolver<K: SvdKernel = SvdHouseholder> {
    config: NsoConfig,
    nj: usize,
    jnt_to_jac: JacobianSolver,
    jac: Jacobian,
    svd: K,
    s_inv: DVector<f64>,
    tmp: DVector<f64>,
    tmp2: DVector<f64>,
    joint_work: DVector<f64>,
    task_work: DVector<f64>,
    opt_pos: JntArray,
    weights: JntArray,
    svd_result: Result<(), SvdError>,
}

impl NsoSolver<SvdHouseholder> {
    /// Solver pulling towards zero with unit weights
    pub fn new(chain: &Chain, config: NsoConfig) -> Self {
        Self::with_kernel(chain, config)
    }
}

impl<K: SvdKernel> NsoSolver<K> {
    pub fn with_kernel(chain: &Chain, config: NsoConfig) -> Self {
        let nj = chain.nr_of_joints();
        Self {
            config,
            nj,
            jnt_to_jac: JacobianSolver::new(chain),
            jac: Jacobian::new(nj),
            svd: K::with_size(TASK_DOF, nj),
            s_inv: DVector::zeros(nj),
            tmp: DVector::zeros(nj),
            tmp2: DVector::zeros(nj),
            joint_work: DVector::zeros(nj),
            task_work: DVector::zeros(TASK_DOF),
            opt_pos: JntArray::new(nj),
            weights: JntArray::from(DVector::from_element(nj, 1.0)),
            svd_result: Ok(()),
        }
    }

    pub fn config(&self) -> &NsoConfig {
        &self.config
    }

    /// Per-joint weights of the posture cost
    pub fn set_weights(&mut self, weights: &JntArray) -> Result<(), SolverError> {
        check_size(self.nj, weights.len())?;
        self.weights.clone_from(weights);
        Ok(())
    }

    /// Preferred joint positions
    pub fn set_opt_pos(&mut self, opt_pos: &JntArray) -> Result<(), SolverError> {
        check_size(self.nj, opt_pos.len())?;
        self.opt_pos.clone_from(opt_pos);
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.config.alpha = alpha;
    }

    pub fn weights(&self) -> &JntArray {
        &self.weights
    }

    pub fn opt_pos(&self) -> &JntArray {
        &self.opt_pos
    }

    pub fn svd_result(&self) -> Result<(), &SvdError> {
        self.svd_result.as_ref().map(|_| ())
    }
}

/// Copy the overlap of `old` into a new array of length `n` filled with
/// `fill`
fn resize_keeping(old: &JntArray, n: usize, fill: f64) -> JntArray {
    let mut resized = DVector::from_element(n, fill);
    let keep = n.min(old.len());
    resized
        .rows_mut(0, keep)
        .copy_from(&old.as_nalgebra().rows(0, keep));
    JntArray::from(resized)
}

impl<K: SvdKernel> Solver for NsoSolver<K> {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        let nj = chain.nr_of_joints();
        self.nj = nj;
        self.jnt_to_jac.update_internal_data_structures(chain);
        self.jac.resize(nj);
        self.svd.resize(TASK_DOF, nj);
        self.s_inv = DVector::zeros(nj);
        self.tmp = DVector::zeros(nj);
        self.tmp2 = DVector::zeros(nj);
        self.joint_work = DVector::zeros(nj);
        self.opt_pos = resize_keeping(&self.opt_pos, nj, 0.0);
        self.weights = resize_keeping(&self.weights, nj, 1.0);
        debug!(nj, "nullspace optimizing solver resized");
    }
}

impl<K: SvdKernel> IkSolverVel for NsoSolver<K> {
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

        self.svd_result = self
            .svd
            .decompose(self.jac.as_nalgebra(), self.config.max_iterations);
        if let Err(err) = &self.svd_result {
            warn!(%err, "nullspace solver decomposition failed");
            qdot_out.set_to_zero();
            return Err(err.clone().into());
        }
        let u = self.svd.u();
        let s = self.svd.singular_values();
        let v = self.svd.v();

        for i in 0..self.nj {
            self.s_inv[i] = if s[i].abs() < self.config.eps {
                0.0
            } else {
                1.0 / s[i]
            };
        }
        for j in 0..TASK_DOF {
            self.task_work[j] = v_in[j];
        }

        // Primary task: V S⁺ Uᵀ v
        self.tmp.gemv_tr(1.0, u, &self.task_work, 0.0);
        self.tmp.component_mul_assign(&self.s_inv);
        let qdot = qdot_out.as_nalgebra_mut();
        qdot.gemv(1.0, v, &self.tmp, 0.0);

        let mut g = 0.0;
        let mut norm = 0.0;
        for i in 0..self.nj {
            let dq = q_in[i] - self.opt_pos[i];
            let w = self.weights[i];
            g += 0.5 * dq * dq * w;
            norm += dq * dq * w * w;
        }

        if norm > MIN_POSTURE_NORM {
            // Pseudo-inverse of the posture cost gradient
            for i in 0..self.nj {
                self.tmp[i] = self.weights[i] * (q_in[i] - self.opt_pos[i]) / norm;
            }
            // J⁺ J tmp = V S⁺ Uᵀ U S Vᵀ tmp
            self.joint_work.gemv_tr(1.0, v, &self.tmp, 0.0);
            self.joint_work.component_mul_assign(s);
            self.task_work.gemv(1.0, u, &self.joint_work, 0.0);
            self.joint_work.gemv_tr(1.0, u, &self.task_work, 0.0);
            self.joint_work.component_mul_assign(&self.s_inv);
            self.tmp2.gemv(1.0, v, &self.joint_work, 0.0);

            let gain = -2.0 * self.config.alpha * g;
            for i in 0..self.nj {
                qdot[i] += gain * (self.tmp[i] - self.tmp2[i]);
            }
        }

        Ok(Outcome::NoError)
    }
}
