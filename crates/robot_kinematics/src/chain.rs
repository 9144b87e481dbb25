use crate::Segment;

/// An ordered, append-only sequence of segments from a fixed base to a tip
///
/// The chain keeps count of its segments and of the non-fixed joints among
/// them. Appending changes those counts, so every solver used with the chain
/// has to be resynchronised with
/// [`Solver::update_internal_data_structures`](crate::Solver::update_internal_data_structures)
/// before its next call.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Segment>", into = "Vec<Segment>"))]
pub struct Chain {
    segments: Vec<Segment>,
    nr_of_joints: usize,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment at the tip
    pub fn add_segment(&mut self, segment: Segment) {
        if !segment.joint().is_fixed() {
            self.nr_of_joints += 1;
        }
        self.segments.push(segment);
    }

    /// Append copies of all segments of `other` at the tip
    pub fn add_chain(&mut self, other: &Chain) {
        for segment in &other.segments {
            self.add_segment(segment.clone());
        }
    }

    /// Number of non-fixed joints, `nj`
    pub fn nr_of_joints(&self) -> usize {
        self.nr_of_joints
    }

    /// Number of segments, `ns`
    pub fn nr_of_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl From<Vec<Segment>> for Chain {
    fn from(segments: Vec<Segment>) -> Self {
        segments.into_iter().collect()
    }
}

impl From<Chain> for Vec<Segment> {
    fn from(chain: Chain) -> Self {
        chain.segments
    }
}

impl FromIterator<Segment> for Chain {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut chain = Chain::new();
        chain.extend(iter);
        chain
    }
}

impl Extend<Segment> for Chain {
    fn extend<I: IntoIterator<Item = Segment>>(&mut self, iter: I) {
        for segment in iter {
            self.add_segment(segment);
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chain ({} segments, {} joints)",
            self.nr_of_segments(),
            self.nr_of_joints
        )?;
        for segment in &self.segments {
            write!(f, "\n  {}: {}", segment.name(), segment.joint())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlignedJoint, Joint};
    use robot_frames::{Frame, Vector};

    fn segment(kind: AlignedJoint) -> Segment {
        Segment::new(
            "segment",
            Joint::aligned("joint", kind),
            Frame::from_translation(Vector::new(0.0, 0.0, 0.5)),
        )
    }

    #[test]
    fn test_counts_skip_fixed_joints() {
        let mut chain = Chain::new();
        assert_eq!(chain.nr_of_joints(), 0);
        assert_eq!(chain.nr_of_segments(), 0);

        chain.add_segment(segment(AlignedJoint::Fixed));
        chain.add_segment(segment(AlignedJoint::RotZ));
        chain.add_segment(segment(AlignedJoint::TransX));
        assert_eq!(chain.nr_of_joints(), 2);
        assert_eq!(chain.nr_of_segments(), 3);

        let active = chain
            .segments()
            .iter()
            .filter(|s| !s.joint().is_fixed())
            .count();
        assert_eq!(active, chain.nr_of_joints());
    }

    #[test]
    fn test_add_chain() {
        let first: Chain = [AlignedJoint::RotZ, AlignedJoint::Fixed]
            .into_iter()
            .map(segment)
            .collect();
        let mut chain = first.clone();
        chain.add_chain(&first);
        assert_eq!(chain.nr_of_segments(), 4);
        assert_eq!(chain.nr_of_joints(), 2);
        assert!(chain.segment(3).is_some_and(|s| s.joint().is_fixed()));
        assert!(chain.segment(4).is_none());
    }

    #[test]
    fn test_display_lists_segments() {
        let chain: Chain = [AlignedJoint::RotY].into_iter().map(segment).collect();
        let text = chain.to_string();
        assert!(text.starts_with("Chain (1 segments, 1 joints)"));
        assert!(text.contains("RotY"));
    }
}
