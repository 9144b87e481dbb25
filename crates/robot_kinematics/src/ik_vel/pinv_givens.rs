use nalgebra::{DMatrix, DVector};
use robot_frames::Twist;
use tracing::{debug, warn};

use super::TASK_DOF;
use crate::error::{SolveResult, SolverError, check_size};
use crate::svd::SvdJacobi;
use crate::{Chain, IkSolverVel, JacobianSolver, JntArray, Jacobian, Outcome, Solver};

/// Tuning of [`PinvGivensSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinvGivensConfig {
    /// Rotation threshold of the Jacobi sweeps
    pub threshold: f64,
    /// Sweep cap per solve
    pub max_sweeps: usize,
}

impl Default for PinvGivensConfig {
    fn default() -> Self {
        Self {
            threshold: 1e-15,
            max_sweeps: 150,
        }
    }
}

/// Pseudo-inverse solver on the warm-started Jacobi SVD
///
/// Meant to be called repeatedly on slowly changing configurations: each
/// call starts from the factors of the previous one and alternates which
/// side it reuses. Chains with more than six joints are decomposed through
/// the transposed Jacobian so the kernel always sees a tall matrix.
///
/// Exactly zero singular values are dropped; there is no `eps` truncation.
#[derive(Clone, Debug)]
pub struct PinvGivensSolver {
    config: PinvGivensConfig,
    nj: usize,
    jnt_to_jac: JacobianSolver,
    jac: Jacobian,
    transpose: bool,
    reuse_v: bool,
    jac_work: DMatrix<f64>,
    svd: SvdJacobi,
    v_in: DVector<f64>,
    uy: DVector<f64>,
    suy: DVector<f64>,
}

impl PinvGivensSolver {
    pub fn new(chain: &Chain, config: PinvGivensConfig) -> Self {
        let nj = chain.nr_of_joints();
        let (m, n) = (nj.max(TASK_DOF), nj.min(TASK_DOF));
        Self {
            config,
            nj,
            jnt_to_jac: JacobianSolver::new(chain),
            jac: Jacobian::new(nj),
            transpose: nj > TASK_DOF,
            reuse_v: false,
            jac_work: DMatrix::zeros(m, n),
            svd: SvdJacobi::new(m, n, config.threshold, config.max_sweeps),
            v_in: DVector::zeros(TASK_DOF),
            uy: DVector::zeros(n),
            suy: DVector::zeros(n),
        }
    }

    pub fn config(&self) -> &PinvGivensConfig {
        &self.config
    }

    /// Singular values of the last solve, in no particular order
    pub fn singular_values(&self) -> &DVector<f64> {
        self.svd.singular_values()
    }
}

impl Solver for PinvGivensSolver {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        let nj = chain.nr_of_joints();
        let (m, n) = (nj.max(TASK_DOF), nj.min(TASK_DOF));
        self.nj = nj;
        self.jnt_to_jac.update_internal_data_structures(chain);
        self.jac.resize(nj);
        self.transpose = nj > TASK_DOF;
        self.reuse_v = false;
        self.jac_work = DMatrix::zeros(m, n);
        self.svd.resize(m, n);
        self.uy = DVector::zeros(n);
        self.suy = DVector::zeros(n);
        debug!(nj, transpose = self.transpose, "Jacobi pseudo-inverse solver resized");
    }
}

impl IkSolverVel for PinvGivensSolver {
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

        self.reuse_v = !self.reuse_v;
        for i in 0..TASK_DOF {
            self.v_in[i] = v_in[i];
        }
        if self.transpose {
            self.jac.as_nalgebra().transpose_to(&mut self.jac_work);
        } else {
            self.jac_work.copy_from(self.jac.as_nalgebra());
        }
        if let Err(err) = self.svd.decompose(&self.jac_work, self.reuse_v) {
            warn!(%err, "Jacobi decomposition failed");
            qdot_out.set_to_zero();
            return Err(err.into());
        }

        let n = self.uy.len();
        let u = self.svd.u();
        let v = self.svd.v();
        if self.transpose {
            self.uy.gemv_tr(1.0, v, &self.v_in, 0.0);
        } else {
            self.uy.gemv_tr(1.0, &u.columns(0, n), &self.v_in, 0.0);
        }
        for (i, &sigma) in self.svd.singular_values().iter().enumerate() {
            self.suy[i] = if sigma != 0.0 { self.uy[i] / sigma } else { 0.0 };
        }
        let qdot = qdot_out.as_nalgebra_mut();
        if self.transpose {
            qdot.gemv(1.0, &u.columns(0, n), &self.suy, 0.0);
        } else {
            qdot.gemv(1.0, v, &self.suy, 0.0);
        }
        Ok(Outcome::NoError)
    }
}
