use robot_frames::{Frame, Rotation, Twist, Vector};

/// Motion generated by a joint
///
/// The axis-aligned variants move along or about the joint frame axes. The
/// `*Axis` variants carry an arbitrary axis through an arbitrary origin,
/// both expressed in the frame of the previous segment tip.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JointType {
    RotAxis { origin: Vector, axis: Vector },
    RotX,
    RotY,
    RotZ,
    TransAxis { origin: Vector, axis: Vector },
    TransX,
    TransY,
    TransZ,
    /// Rigid connection without a degree of freedom
    Fixed,
}

/// A one degree of freedom motion generator
///
/// A joint maps a scalar joint value `q` to a rigid offset and a joint
/// velocity `qdot` to a twist. The value actually applied is
/// `q * scale + offset`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    /// Name of the joint
    name: String,

    /// Kind of motion and, for the `*Axis` kinds, its unit axis and origin
    kind: JointType,

    /// Factor applied to the joint value
    scale: f64,

    /// Value added after scaling
    offset: f64,
}

impl Joint {
    /// Create a new joint with unit scale and zero offset
    ///
    /// # Arguments
    /// * `name` - Name identifier for the joint
    /// * `kind` - The motion the joint generates; arbitrary axes are
    ///   normalized
    ///
    /// # Errors
    /// An arbitrary-axis joint whose axis has no length.
    ///
    /// # Example
    /// ```rust
    /// use robot_kinematics::{Joint, JointType};
    /// use robot_kinematics::robot_frames::Vector;
    ///
    /// let joint = Joint::new(
    ///     "wrist",
    ///     JointType::RotAxis {
    ///         origin: Vector::zero(),
    ///         axis: Vector::new(0.0, 0.0, 2.0),
    ///     },
    /// )
    /// .unwrap();
    /// assert_eq!(joint.name(), "wrist");
    /// assert_eq!(joint.axis(), Vector::new(0.0, 0.0, 1.0));
    /// ```
    pub fn new(name: impl Into<String>, kind: JointType) -> robot_frames::Result<Self> {
        let kind = match kind {
            JointType::RotAxis { origin, axis } => JointType::RotAxis {
                origin,
                axis: axis.normalized()?,
            },
            JointType::TransAxis { origin, axis } => JointType::TransAxis {
                origin,
                axis: axis.normalized()?,
            },
            other => other,
        };
        Ok(Self {
            name: name.into(),
            kind,
            scale: 1.0,
            offset: 0.0,
        })
    }

    /// An axis-aligned or fixed joint, which cannot fail to build
    pub fn aligned(name: impl Into<String>, kind: AlignedJoint) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// A joint without degree of freedom
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::aligned(name, AlignedJoint::Fixed)
    }

    /// Replace the scale factor applied to the joint value
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Replace the offset added to the scaled joint value
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Get the joint name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &JointType {
        &self.kind
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Whether the joint contributes a degree of freedom to its chain
    pub fn is_fixed(&self) -> bool {
        matches!(self.kind, JointType::Fixed)
    }

    /// Unit axis of motion in the previous tip frame, zero for fixed joints
    pub fn axis(&self) -> Vector {
        match self.kind {
            JointType::RotAxis { axis, .. } | JointType::TransAxis { axis, .. } => axis,
            JointType::RotX | JointType::TransX => Vector::new(1.0, 0.0, 0.0),
            JointType::RotY | JointType::TransY => Vector::new(0.0, 1.0, 0.0),
            JointType::RotZ | JointType::TransZ => Vector::new(0.0, 0.0, 1.0),
            JointType::Fixed => Vector::zero(),
        }
    }

    /// Point the axis passes through
    pub fn origin(&self) -> Vector {
        match self.kind {
            JointType::RotAxis { origin, .. } | JointType::TransAxis { origin, .. } => origin,
            _ => Vector::zero(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            JointType::RotAxis { .. } => "RotAxis",
            JointType::RotX => "RotX",
            JointType::RotY => "RotY",
            JointType::RotZ => "RotZ",
            JointType::TransAxis { .. } => "TransAxis",
            JointType::TransX => "TransX",
            JointType::TransY => "TransY",
            JointType::TransZ => "TransZ",
            JointType::Fixed => "Fixed",
        }
    }

    /// Calculate the rigid offset for joint value `q`
    ///
    /// # Example
    /// ```rust
    /// use robot_kinematics::{AlignedJoint, Joint};
    /// use robot_kinematics::robot_frames::{Rotation, Vector};
    /// use std::f64::consts::PI;
    ///
    /// let joint = Joint::aligned("elbow", AlignedJoint::RotZ);
    /// let frame = joint.pose(PI / 2.0);
    /// assert_eq!(frame.m, Rotation::rot_z(PI / 2.0));
    /// assert_eq!(frame.p, Vector::zero());
    /// ```
    pub fn pose(&self, q: f64) -> Frame {
        let value = self.scale * q + self.offset;
        match self.kind {
            JointType::RotAxis { origin, axis } => {
                Frame::new(Rotation::rot_normalized(axis, value), origin)
            }
            JointType::RotX => Frame::from_rotation(Rotation::rot_x(value)),
            JointType::RotY => Frame::from_rotation(Rotation::rot_y(value)),
            JointType::RotZ => Frame::from_rotation(Rotation::rot_z(value)),
            JointType::TransAxis { origin, axis } => Frame::from_translation(origin + axis * value),
            JointType::TransX => Frame::from_translation(Vector::new(value, 0.0, 0.0)),
            JointType::TransY => Frame::from_translation(Vector::new(0.0, value, 0.0)),
            JointType::TransZ => Frame::from_translation(Vector::new(0.0, 0.0, value)),
            JointType::Fixed => Frame::identity(),
        }
    }

    /// Calculate the twist caused by joint velocity `qdot`
    ///
    /// The reference point is the joint origin. Offsets do not affect
    /// velocities; the scale does.
    pub fn twist(&self, qdot: f64) -> Twist {
        let rate = self.scale * qdot;
        match self.kind {
            JointType::RotAxis { .. }
            | JointType::RotX
            | JointType::RotY
            | JointType::RotZ => Twist::new(Vector::zero(), self.axis() * rate),
            JointType::TransAxis { .. }
            | JointType::TransX
            | JointType::TransY
            | JointType::TransZ => Twist::new(self.axis() * rate, Vector::zero()),
            JointType::Fixed => Twist::zero(),
        }
    }
}

/// Joint kinds that need no axis, for [`Joint::aligned`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignedJoint {
    RotX,
    RotY,
    RotZ,
    TransX,
    TransY,
    TransZ,
    Fixed,
}

impl From<AlignedJoint> for JointType {
    fn from(kind: AlignedJoint) -> Self {
        match kind {
            AlignedJoint::RotX => JointType::RotX,
            AlignedJoint::RotY => JointType::RotY,
            AlignedJoint::RotZ => JointType::RotZ,
            AlignedJoint::TransX => JointType::TransX,
            AlignedJoint::TransY => JointType::TransY,
            AlignedJoint::TransZ => JointType::TransZ,
            AlignedJoint::Fixed => JointType::Fixed,
        }
    }
}

impl Default for Joint {
    fn default() -> Self {
        Self::fixed("NoName")
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Joint '{}' ({}, scale: {}, offset: {})",
            self.name,
            self.type_name(),
            self.scale,
            self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_joint_creation() {
        let joint = Joint::aligned("test_joint", AlignedJoint::RotZ);
        assert_eq!(joint.name(), "test_joint");
        assert_eq!(joint.scale(), 1.0);
        assert_eq!(joint.offset(), 0.0);
        assert!(!joint.is_fixed());
        assert_eq!(joint.type_name(), "RotZ");
    }

    #[test]
    fn test_default_is_fixed() {
        let joint = Joint::default();
        assert!(joint.is_fixed());
        assert_eq!(joint.pose(1.0), Frame::identity());
        assert_eq!(joint.twist(1.0), Twist::zero());
        assert_eq!(joint.axis(), Vector::zero());
    }

    #[test]
    fn test_axis_normalization() {
        let joint = Joint::new(
            "axis_joint",
            JointType::TransAxis {
                origin: Vector::new(1.0, 2.0, 3.0),
                axis: Vector::new(3.0, 4.0, 0.0),
            },
        )
        .unwrap();

        // Should be normalized to unit length and keep its direction
        assert!((joint.axis().norm() - 1.0).abs() < 1e-10);
        assert_abs_diff_eq!(joint.axis(), Vector::new(0.6, 0.8, 0.0), epsilon = 1e-15);
        assert_eq!(joint.origin(), Vector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_zero_axis_is_rejected() {
        let result = Joint::new(
            "broken",
            JointType::RotAxis {
                origin: Vector::zero(),
                axis: Vector::zero(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_aligned_rotation_poses() {
        let q = 0.7;
        let cases = [
            (AlignedJoint::RotX, Rotation::rot_x(q)),
            (AlignedJoint::RotY, Rotation::rot_y(q)),
            (AlignedJoint::RotZ, Rotation::rot_z(q)),
        ];
        for (kind, expected) in cases {
            let frame = Joint::aligned("j", kind).pose(q);
            assert_eq!(frame.m, expected);
            assert_eq!(frame.p, Vector::zero());
        }
    }

    #[test]
    fn test_aligned_translation_poses() {
        let joint = Joint::aligned("slider", AlignedJoint::TransY);
        let frame = joint.pose(0.25);
        assert_eq!(frame.m, Rotation::identity());
        assert_eq!(frame.p, Vector::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn test_arbitrary_axis_matches_aligned() {
        let joint = Joint::new(
            "z",
            JointType::RotAxis {
                origin: Vector::zero(),
                axis: Vector::new(0.0, 0.0, 1.0),
            },
        )
        .unwrap();
        assert_abs_diff_eq!(
            joint.pose(1.2),
            Joint::aligned("z", AlignedJoint::RotZ).pose(1.2),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_rot_axis_origin_is_fixed_point() {
        let origin = Vector::new(1.0, 0.0, 0.0);
        let joint = Joint::new(
            "offset_joint",
            JointType::RotAxis {
                origin,
                axis: Vector::new(0.0, 1.0, 0.0),
            },
        )
        .unwrap();
        for q in [0.0, 0.5, PI] {
            assert_eq!(joint.pose(q).p, origin);
        }
    }

    #[test]
    fn test_scale_and_offset() {
        let joint = Joint::aligned("scaled", AlignedJoint::RotX)
            .with_scale(2.0)
            .with_offset(0.1);
        assert_abs_diff_eq!(joint.pose(0.3).m, Rotation::rot_x(0.7), epsilon = 1e-15);
        // Offsets shift position only, velocity scales
        assert_eq!(
            joint.twist(1.5),
            Twist::new(Vector::zero(), Vector::new(3.0, 0.0, 0.0))
        );
    }

    #[test]
    fn test_twist_directions() {
        let rot = Joint::aligned("r", AlignedJoint::RotY).twist(2.0);
        assert_eq!(rot, Twist::new(Vector::zero(), Vector::new(0.0, 2.0, 0.0)));

        let trans = Joint::aligned("t", AlignedJoint::TransZ).twist(-1.0);
        assert_eq!(trans, Twist::new(Vector::new(0.0, 0.0, -1.0), Vector::zero()));
    }

    #[test]
    fn test_display() {
        let joint = Joint::aligned("display_joint", AlignedJoint::TransX);
        let display_str = format!("{}", joint);
        assert!(display_str.contains("display_joint"));
        assert!(display_str.contains("TransX"));
    }
}
