use robot_frames::{Frame, diff};
use tracing::debug;

use crate::error::{SolveResult, SolverError, check_size};
use crate::{Chain, FkSolverPos, IkSolverPos, IkSolverVel, JntArray, Outcome, Solver};

/// Tuning of [`NrJlSolver`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NrJlConfig {
    pub max_iterations: usize,
    /// Converged once the norm of the pose error twist drops below this
    pub eps: f64,
}

impl Default for NrJlConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            eps: 1e-6,
        }
    }
}

/// Newton-Raphson position solver that keeps joints inside their limits
///
/// Each iteration evaluates the pose with `F`, turns the remaining pose
/// error into a joint step with `V`, applies it and clamps every joint into
/// `[q_min, q_max]`. Both sub-solvers are owned; pass `&mut solver` to keep
/// using them elsewhere.
#[derive(Clone, Debug)]
pub struct NrJlSolver<F, V> {
    config: NrJlConfig,
    nj: usize,
    q_min: JntArray,
    q_max: JntArray,
    fk: F,
    ik_vel: V,
    delta_q: JntArray,
}

impl<F: FkSolverPos, V: IkSolverVel> NrJlSolver<F, V> {
    /// Solver without joint limits
    pub fn new(chain: &Chain, fk: F, ik_vel: V, config: NrJlConfig) -> Self {
        let nj = chain.nr_of_joints();
        Self {
            config,
            nj,
            q_min: unbounded(nj, f64::NEG_INFINITY),
            q_max: unbounded(nj, f64::INFINITY),
            fk,
            ik_vel,
            delta_q: JntArray::new(nj),
        }
    }

    pub fn config(&self) -> &NrJlConfig {
        &self.config
    }

    pub fn set_joint_limits(
        &mut self,
        q_min: &JntArray,
        q_max: &JntArray,
    ) -> Result<(), SolverError> {
        check_size(self.nj, q_min.len())?;
        check_size(self.nj, q_max.len())?;
        self.q_min.clone_from(q_min);
        self.q_max.clone_from(q_max);
        Ok(())
    }

    pub fn joint_limits(&self) -> (&JntArray, &JntArray) {
        (&self.q_min, &self.q_max)
    }

    pub fn fk(&self) -> &F {
        &self.fk
    }

    pub fn ik_vel(&self) -> &V {
        &self.ik_vel
    }

    fn clamp(&self, q: &mut JntArray) {
        for i in 0..self.nj {
            if q[i] < self.q_min[i] {
                q[i] = self.q_min[i];
            } else if q[i] > self.q_max[i] {
                q[i] = self.q_max[i];
            }
        }
    }
}

fn unbounded(nj: usize, bound: f64) -> JntArray {
    JntArray::from(vec![bound; nj])
}

/// Resize `limits` to `nj`, padding new joints with `bound`
fn resize_limits(limits: &JntArray, nj: usize, bound: f64) -> JntArray {
    let mut resized = unbounded(nj, bound);
    for i in 0..nj.min(limits.len()) {
        resized[i] = limits[i];
    }
    resized
}

impl<F: FkSolverPos, V: IkSolverVel> Solver for NrJlSolver<F, V> {
    fn update_internal_data_structures(&mut self, chain: &Chain) {
        self.nj = chain.nr_of_joints();
        self.q_min = resize_limits(&self.q_min, self.nj, f64::NEG_INFINITY);
        self.q_max = resize_limits(&self.q_max, self.nj, f64::INFINITY);
        self.delta_q.resize(self.nj);
        self.fk.update_internal_data_structures(chain);
        self.ik_vel.update_internal_data_structures(chain);
        debug!(nj = self.nj, "Newton-Raphson position solver resized");
    }

    fn str_error(&self, code: i32) -> &'static str {
        match code {
            -100 => "Child IK velocity solver failed",
            -101 => "Child FK position solver failed",
            _ => crate::error::describe(code),
        }
    }
}

impl<F: FkSolverPos, V: IkSolverVel> IkSolverPos for NrJlSolver<F, V> {
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

        q_out.as_nalgebra_mut().copy_from(q_init.as_nalgebra());
        self.clamp(q_out);

        let mut pose = Frame::identity();
        for iteration in 0..self.config.max_iterations {
            self.fk
                .jnt_to_cart(chain, q_out, &mut pose, None)
                .map_err(|err| SolverError::FkSolverPosFailed(Box::new(err)))?;
            let delta_twist = diff(&pose, p_in);
            let error = delta_twist.norm();
            if error < self.config.eps {
                debug!(iteration, error, "Newton-Raphson position solve converged");
                return Ok(Outcome::NoError);
            }

            self.ik_vel
                .cart_to_jnt(chain, q_out, &delta_twist, &mut self.delta_q)
                .map_err(|err| SolverError::IkSolverVelFailed(Box::new(err)))?;
            *q_out.as_nalgebra_mut() += self.delta_q.as_nalgebra();
            self.clamp(q_out);
        }

        debug!(
            max_iterations = self.config.max_iterations,
            "Newton-Raphson position solve ran out of iterations"
        );
        Err(SolverError::MaxIterationsExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ik_vel::test_support::*;
    use crate::{PinvConfig, PinvSolver, RecursiveFkSolver, WdlsConfig, WdlsSolver};

    fn target(chain: &Chain, q: &JntArray) -> Frame {
        let mut pose = Frame::identity();
        RecursiveFkSolver::new()
            .jnt_to_cart(chain, q, &mut pose, None)
            .unwrap();
        pose
    }

    #[test_log::test]
    fn test_reaches_a_reachable_pose() {
        let chain = six_dof_arm();
        let goal = target(&chain, &generic_configuration(6));
        let mut solver = NrJlSolver::new(
            &chain,
            RecursiveFkSolver::new(),
            PinvSolver::new(&chain, PinvConfig::default()),
            NrJlConfig::default(),
        );

        let mut seed = generic_configuration(6);
        for i in 0..6 {
            seed[i] += 0.1;
        }
        let mut q = JntArray::new(6);
        assert_eq!(
            solver.cart_to_jnt(&chain, &seed, &goal, &mut q).unwrap(),
            Outcome::NoError
        );
        let reached = target(&chain, &q);
        assert!(diff(&reached, &goal).norm() < 1e-6);
    }

    #[test_log::test]
    fn test_respects_joint_limits() {
        let chain = six_dof_arm();
        let goal = target(&chain, &generic_configuration(6));
        let mut pinv = PinvSolver::new(&chain, PinvConfig::default());
        let mut solver = NrJlSolver::new(
            &chain,
            RecursiveFkSolver::new(),
            &mut pinv,
            NrJlConfig {
                max_iterations: 20,
                ..NrJlConfig::default()
            },
        );
        let q_min = JntArray::from(vec![-0.2; 6]);
        let q_max = JntArray::from(vec![0.2; 6]);
        solver.set_joint_limits(&q_min, &q_max).unwrap();

        // The goal needs joints outside the limits, and the seed starts there
        let mut q = JntArray::new(6);
        let result = solver.cart_to_jnt(&chain, &generic_configuration(6), &goal, &mut q);
        assert!(matches!(result, Err(SolverError::MaxIterationsExceeded)));
        assert!(q.as_slice().iter().all(|&x| (-0.2..=0.2).contains(&x)));
    }

    #[test]
    fn test_seed_already_at_goal() {
        let chain = six_dof_arm();
        let seed = generic_configuration(6);
        let goal = target(&chain, &seed);
        let mut solver = NrJlSolver::new(
            &chain,
            RecursiveFkSolver::new(),
            WdlsSolver::new(&chain, WdlsConfig::default()),
            NrJlConfig::default(),
        );
        let mut q = JntArray::new(6);
        solver.cart_to_jnt(&chain, &seed, &goal, &mut q).unwrap();
        assert_eq!(q, seed);
    }

    #[test]
    fn test_child_failure_is_wrapped() {
        let chain = six_dof_arm();
        let mut pinv = PinvSolver::new(&chain, PinvConfig::default());
        pinv.set_max_iterations(0);
        let mut solver = NrJlSolver::new(
            &chain,
            RecursiveFkSolver::new(),
            pinv,
            NrJlConfig::default(),
        );
        let goal = Frame::from_translation(robot_frames::Vector::new(0.3, 0.3, 0.9));
        let mut q = JntArray::new(6);
        let err = solver
            .cart_to_jnt(&chain, &generic_configuration(6), &goal, &mut q)
            .unwrap_err();
        assert_eq!(err.code(), -100);
        assert!(matches!(
            err,
            SolverError::IkSolverVelFailed(ref child) if matches!(**child, SolverError::SvdFailed(_))
        ));
        assert_eq!(solver.str_error(-100), "Child IK velocity solver failed");
    }

    #[test]
    fn test_size_checks() {
        let mut chain = six_dof_arm();
        let mut solver = NrJlSolver::new(
            &chain,
            RecursiveFkSolver::new(),
            PinvSolver::new(&chain, PinvConfig::default()),
            NrJlConfig::default(),
        );
        assert!(matches!(
            solver.set_joint_limits(&JntArray::new(5), &JntArray::new(6)),
            Err(SolverError::SizeMismatch { expected: 6, actual: 5 })
        ));

        let mut q = JntArray::from(vec![4.0; 6]);
        let goal = Frame::identity();
        assert!(matches!(
            solver.cart_to_jnt(&chain, &JntArray::new(5), &goal, &mut q),
            Err(SolverError::SizeMismatch { .. })
        ));
        assert_eq!(q, JntArray::from(vec![4.0; 6]));

        chain.add_chain(&planar_two_link());
        assert!(matches!(
            solver.cart_to_jnt(&chain, &JntArray::new(8), &goal, &mut JntArray::new(8)),
            Err(SolverError::NotUpToDate)
        ));
        solver.update_internal_data_structures(&chain);
        let (q_min, q_max) = solver.joint_limits();
        assert_eq!(q_min.len(), 8);
        assert_eq!(q_max[7], f64::INFINITY);
        assert_eq!(q_min[0], f64::NEG_INFINITY);
    }
}
