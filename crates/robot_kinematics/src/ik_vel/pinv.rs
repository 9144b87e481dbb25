use nalgebra::DVector;
use robot_frames::Twist;
use tracing::{debug, warn};

use super::{describe_pinv, project_twist, truncation_outcome};
use crate::error::{SolveResult, SolverError, check_size};
use crate::svd::{SvdError, SvdHouseholder, SvdKernel};
use crate::{Chain, IkSolverVel, JacobianSolver, JntArray, Jacobian, Solver};

/// Tuning of [`PinvSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinvConfig {
    /// Singular values below this are treated as zero
    pub eps: f64,
    /// Iteration cap of the SVD
    pub max_iterations: usize,
}

impl Default for PinvConfig {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            max_iterations: 150,
        }
    }
}

/// Joint velocities from the truncated SVD pseudo-inverse of the Jacobian
///
/// `qdot = V S⁺ Uᵀ v`, where singular values below `eps` are dropped instead
/// of inverted. A solution that drops more of them than the chain's
/// redundancy explains is reported as [`Outcome::PinvSingular`].
///
/// [`Outcome::PinvSingular`]: crate::Outcome::PinvSingular
#[derive(Clone, Debug)]
pub struct PinvSolver<K: SvdKernel = SvdHouseholder> {
    config: PinvConfig,
    nj: usize,
    jnt_to_jac: JacobianSolver,
    jac: Jacobian,
    svd: K,
    tmp: DVector<f64>,
    nr_zero_sigmas: usize,
    svd_result: Result<(), SvdError>,
}

impl PinvSolver<SvdHouseholder> {
    pub fn new(chain: &Chain, config: PinvConfig) -> Self {
        Self::with_kernel(chain, config)
    }
}

impl<K: SvdKernel> PinvSolver<K> {
    /// Solver decomposing with the kernel `K`
    pub fn with_kernel(chain: &Chain, config: PinvConfig) -> Self {
        let nj = chain.nr_of_joints();
        Self {
            config,
            nj,
            jnt_to_jac: JacobianSolver::new(chain),
            jac: Jacobian::new(nj),
            svd: K::with_size(6, nj),
            tmp: DVector::zeros(nj),
            nr_zero_sigmas: 0,
            svd_result: Ok(()),
        }
    }

    pub fn config(&self) -> &PinvConfig {
        &self.config
    }

    pub fn set_eps(&mut self, eps: f64) {
        self.config.eps = eps;
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    /// Singular values treated as zero by the last solve
    pub fn nr_zero_sigmas(&self) -> usize {
        self.nr_zero_sigmas
    }

    /// Outcome of the last decomposition
    pub fn svd_result(&self) -> Result<(), &SvdError> {
        self.svd_result.as_ref().map(|_| ())
    }
}

impl<K: SvdKernel> Solver for PinvSolver<K> {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        self.nj = chain.nr_of_joints();
        self.jnt_to_jac.update_internal_data_structures(chain);
        self.jac.resize(self.nj);
        self.svd.resize(6, self.nj);
        self.tmp = DVector::zeros(self.nj);
        debug!(nj = self.nj, "pseudo-inverse solver resized");
    }

    fn str_error(&self, code: i32) -> &'static str {
        describe_pinv(code)
    }
}

impl<K: SvdKernel> IkSolverVel for PinvSolver<K> {
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
        self.svd_result = self
            .svd
            .decompose(self.jac.as_nalgebra(), self.config.max_iterations);
        if let Err(err) = &self.svd_result {
            warn!(%err, "pseudo-inverse decomposition failed");
            qdot_out.set_to_zero();
            return Err(err.clone().into());
        }

        let u = self.svd.u();
        let s = self.svd.singular_values();
        for i in 0..self.nj {
            if s[i].abs() < self.config.eps {
                self.tmp[i] = 0.0;
                self.nr_zero_sigmas += 1;
            } else {
                self.tmp[i] = project_twist(u, v_in, i) / s[i];
            }
        }
        qdot_out
            .as_nalgebra_mut()
            .gemv(1.0, self.svd.v(), &self.tmp, 0.0);

        Ok(truncation_outcome(self.nr_zero_sigmas, self.nj))
    }
}
