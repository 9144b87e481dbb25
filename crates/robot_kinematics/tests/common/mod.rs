#![allow(dead_code)]

use robot_frames::{Frame, Twist, Vector};
use robot_kinematics::{
    AlignedJoint, Chain, FkSolverPos, JacobianSolver, JntArray, Jacobian, Joint,
    RecursiveFkSolver, Segment,
};

/// Yaw, shoulder, elbow and a spherical wrist, stretched along z at zero
pub fn arm() -> Chain {
    [
        (AlignedJoint::RotZ, 0.3),
        (AlignedJoint::RotY, 0.5),
        (AlignedJoint::RotY, 0.4),
        (AlignedJoint::RotZ, 0.1),
        (AlignedJoint::RotY, 0.1),
        (AlignedJoint::RotZ, 0.08),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (kind, length))| {
        Segment::new(
            format!("link{i}"),
            Joint::aligned(format!("joint{i}"), kind),
            Frame::from_translation(Vector::new(0.0, 0.0, length)),
        )
    })
    .collect()
}

pub fn pose(chain: &Chain, q: &JntArray) -> Frame {
    let mut pose = Frame::identity();
    RecursiveFkSolver::new()
        .jnt_to_cart(chain, q, &mut pose, None)
        .unwrap();
    pose
}

pub fn jacobian_times(chain: &Chain, q: &JntArray, qdot: &JntArray) -> Twist {
    let mut jac = Jacobian::new(chain.nr_of_joints());
    JacobianSolver::new(chain)
        .jnt_to_jac(chain, q, &mut jac, None)
        .unwrap();
    let product = jac.as_nalgebra() * qdot.as_nalgebra();
    Twist::from([
        product[0], product[1], product[2], product[3], product[4], product[5],
    ])
}
