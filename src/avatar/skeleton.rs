//! Hand joint addressing and pose snapshots
//!
//! The native avatar skeleton names its hand bones with hierarchical path
//! strings. The table here maps the small set of joints the replication layer
//! cares about onto those paths; it is fixed at compile time and exhaustive
//! over both axes, so lookup is total and never fails.

use serde::{Deserialize, Serialize};

/// Which hand a joint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandSide {
    Right,
    Left,
}

impl HandSide {
    /// Both sides, in table order
    pub const ALL: [HandSide; 2] = [HandSide::Right, HandSide::Left];
}

/// Joint roles tracked per hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandJoint {
    HandBase,
    IndexBase,
    IndexTip,
    ThumbBase,
    ThumbTip,
}

impl HandJoint {
    /// All joint roles, in table order
    pub const ALL: [HandJoint; 5] = [
        HandJoint::HandBase,
        HandJoint::IndexBase,
        HandJoint::IndexTip,
        HandJoint::ThumbBase,
        HandJoint::ThumbTip,
    ];
}

/// Number of tracked joints per hand.
pub const HAND_JOINT_COUNT: usize = HandJoint::ALL.len();

// Bone paths as named by the native skeleton, indexed [side][joint].
const HAND_JOINT_PATHS: [[&str; HAND_JOINT_COUNT]; 2] = [
    [
        "hands:r_hand_world",
        "hands:r_hand_world/hands:b_r_hand/hands:b_r_index1",
        "hands:r_hand_world/hands:b_r_hand/hands:b_r_index1/hands:b_r_index2/hands:b_r_index3/hands:b_r_index_ignore",
        "hands:r_hand_world/hands:b_r_hand/hands:b_r_thumb1/hands:b_r_thumb2",
        "hands:r_hand_world/hands:b_r_hand/hands:b_r_thumb1/hands:b_r_thumb2/hands:b_r_thumb3/hands:b_r_thumb_ignore",
    ],
    [
        "hands:l_hand_world",
        "hands:l_hand_world/hands:b_l_hand/hands:b_l_index1",
        "hands:l_hand_world/hands:b_l_hand/hands:b_l_index1/hands:b_l_index2/hands:b_l_index3/hands:b_l_index_ignore",
        "hands:l_hand_world/hands:b_l_hand/hands:b_l_thumb1/hands:b_l_thumb2",
        "hands:l_hand_world/hands:b_l_hand/hands:b_l_thumb1/hands:b_l_thumb2/hands:b_l_thumb3/hands:b_l_thumb_ignore",
    ],
];

/// Resolve the hierarchical bone path for a hand joint.
pub fn bone_path(side: HandSide, joint: HandJoint) -> &'static str {
    HAND_JOINT_PATHS[side as usize][joint as usize]
}

/// A bone transform as it travels in packets.
///
/// Plain float arrays rather than math-library types; position is (x, y, z),
/// rotation is a quaternion (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Per-hand joint transforms, indexed in [`HandJoint::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandFrame {
    pub joints: [Transform; HAND_JOINT_COUNT],
}

impl HandFrame {
    /// Get the transform tracked for a joint role
    pub fn joint(&self, joint: HandJoint) -> &Transform {
        &self.joints[joint as usize]
    }
}

/// One skeletal sample: root transform plus both hands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub root: Transform,
    pub right_hand: HandFrame,
    pub left_hand: HandFrame,
}

impl PoseSnapshot {
    /// Get a hand frame by side
    pub fn hand(&self, side: HandSide) -> &HandFrame {
        match side {
            HandSide::Right => &self.right_hand,
            HandSide::Left => &self.left_hand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bone_path_table_is_exhaustive_and_distinct() {
        let mut seen = HashSet::new();
        for side in HandSide::ALL {
            for joint in HandJoint::ALL {
                let path = bone_path(side, joint);
                assert!(!path.is_empty());
                assert!(seen.insert(path), "duplicate path: {}", path);
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_sides_resolve_to_distinct_paths() {
        let right = bone_path(HandSide::Right, HandJoint::IndexTip);
        let left = bone_path(HandSide::Left, HandJoint::IndexTip);
        assert_ne!(right, left);
        assert!(right.contains("b_r_index"));
        assert!(left.contains("b_l_index"));

        // Repeated lookups are stable
        assert_eq!(right, bone_path(HandSide::Right, HandJoint::IndexTip));
    }

    #[test]
    fn test_bases_are_prefixes_of_tips() {
        for side in HandSide::ALL {
            let base = bone_path(side, HandJoint::HandBase);
            let index_tip = bone_path(side, HandJoint::IndexTip);
            let thumb_tip = bone_path(side, HandJoint::ThumbTip);
            assert!(index_tip.starts_with(base));
            assert!(thumb_tip.starts_with(base));
        }
    }

    #[test]
    fn test_default_transform_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, [0.0; 3]);
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_hand_frame_indexing() {
        let mut frame = HandFrame::default();
        frame.joints[HandJoint::ThumbTip as usize].position = [0.1, 0.2, 0.3];

        let pose = PoseSnapshot {
            right_hand: frame,
            ..PoseSnapshot::default()
        };
        assert_eq!(
            pose.hand(HandSide::Right).joint(HandJoint::ThumbTip).position,
            [0.1, 0.2, 0.3]
        );
        assert_eq!(
            pose.hand(HandSide::Left).joint(HandJoint::ThumbTip).position,
            [0.0; 3]
        );
    }
}
