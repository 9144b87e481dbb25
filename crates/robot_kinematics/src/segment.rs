use robot_frames::{Frame, Twist};

use crate::Joint;

/// A joint followed by a rigid link
///
/// `f_tip` is the link: the transform from the joint frame to the segment
/// tip, where the next segment attaches.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    name: String,
    joint: Joint,
    f_tip: Frame,
}

impl Segment {
    pub fn new(name: impl Into<String>, joint: Joint, f_tip: Frame) -> Self {
        Self {
            name: name.into(),
            joint,
            f_tip,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joint(&self) -> &Joint {
        &self.joint
    }

    /// Transform from the joint frame to the segment tip
    pub fn frame_to_tip(&self) -> &Frame {
        &self.f_tip
    }

    /// Pose of the segment tip relative to its root for joint value `q`
    pub fn pose(&self, q: f64) -> Frame {
        self.joint.pose(q) * self.f_tip
    }

    /// Twist of the segment tip relative to its root, referenced at the tip
    /// and expressed in root coordinates
    pub fn twist(&self, q: f64, qdot: f64) -> Twist {
        let joint_pose = self.joint.pose(q);
        self.joint
            .twist(qdot)
            .ref_point(joint_pose.m * self.f_tip.p)
    }
}
