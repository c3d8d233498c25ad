//! Hand skeleton joints and the fixed pose buffer they are sampled into.
//!
//! A hand is 25 joints: the wrist, four thumb segments, and five segments
//! for each remaining finger. Every joint carries a 4x4 column-major
//! transform (16 floats) expressed against the session's reference frame,
//! so a full snapshot is exactly 400 floats.

use std::str::FromStr;

use glam::{Mat4, Vec3};
use thiserror::Error;

pub const JOINT_COUNT: usize = 25;
pub const FLOATS_PER_JOINT: usize = 16;
pub const SNAPSHOT_LEN: usize = JOINT_COUNT * FLOATS_PER_JOINT;

#[derive(Debug, Error)]
pub enum JointError {
    #[error("unknown joint name: {0}")]
    UnknownJoint(String),
    #[error("snapshot length mismatch: got {got}, expected 400")]
    BadLength { got: usize },
}

/// The 25 canonical joints, in device fill order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointName {
    Wrist,
    ThumbMetacarpal,
    ThumbPhalanxProximal,
    ThumbPhalanxDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexPhalanxProximal,
    IndexPhalanxIntermediate,
    IndexPhalanxDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddlePhalanxProximal,
    MiddlePhalanxIntermediate,
    MiddlePhalanxDistal,
    MiddleTip,
    RingMetacarpal,
    RingPhalanxProximal,
    RingPhalanxIntermediate,
    RingPhalanxDistal,
    RingTip,
    PinkyMetacarpal,
    PinkyPhalanxProximal,
    PinkyPhalanxIntermediate,
    PinkyPhalanxDistal,
    PinkyTip,
}

impl JointName {
    pub const ALL: [JointName; JOINT_COUNT] = [
        JointName::Wrist,
        JointName::ThumbMetacarpal,
        JointName::ThumbPhalanxProximal,
        JointName::ThumbPhalanxDistal,
        JointName::ThumbTip,
        JointName::IndexMetacarpal,
        JointName::IndexPhalanxProximal,
        JointName::IndexPhalanxIntermediate,
        JointName::IndexPhalanxDistal,
        JointName::IndexTip,
        JointName::MiddleMetacarpal,
        JointName::MiddlePhalanxProximal,
        JointName::MiddlePhalanxIntermediate,
        JointName::MiddlePhalanxDistal,
        JointName::MiddleTip,
        JointName::RingMetacarpal,
        JointName::RingPhalanxProximal,
        JointName::RingPhalanxIntermediate,
        JointName::RingPhalanxDistal,
        JointName::RingTip,
        JointName::PinkyMetacarpal,
        JointName::PinkyPhalanxProximal,
        JointName::PinkyPhalanxIntermediate,
        JointName::PinkyPhalanxDistal,
        JointName::PinkyTip,
    ];

    /// Position in the canonical fill order.
    pub fn index(self) -> usize {
        match self {
            JointName::Wrist => 0,
            JointName::ThumbMetacarpal => 1,
            JointName::ThumbPhalanxProximal => 2,
            JointName::ThumbPhalanxDistal => 3,
            JointName::ThumbTip => 4,
            JointName::IndexMetacarpal => 5,
            JointName::IndexPhalanxProximal => 6,
            JointName::IndexPhalanxIntermediate => 7,
            JointName::IndexPhalanxDistal => 8,
            JointName::IndexTip => 9,
            JointName::MiddleMetacarpal => 10,
            JointName::MiddlePhalanxProximal => 11,
            JointName::MiddlePhalanxIntermediate => 12,
            JointName::MiddlePhalanxDistal => 13,
            JointName::MiddleTip => 14,
            JointName::RingMetacarpal => 15,
            JointName::RingPhalanxProximal => 16,
            JointName::RingPhalanxIntermediate => 17,
            JointName::RingPhalanxDistal => 18,
            JointName::RingTip => 19,
            JointName::PinkyMetacarpal => 20,
            JointName::PinkyPhalanxProximal => 21,
            JointName::PinkyPhalanxIntermediate => 22,
            JointName::PinkyPhalanxDistal => 23,
            JointName::PinkyTip => 24,
        }
    }

    /// Offset of this joint's 16-float transform within a flat snapshot.
    pub fn offset(self) -> usize {
        self.index() * FLOATS_PER_JOINT
    }

    /// Canonical underscore-separated wire name.
    pub fn label(self) -> &'static str {
        match self {
            JointName::Wrist => "Wrist",
            JointName::ThumbMetacarpal => "Thumb_Metacarpal",
            JointName::ThumbPhalanxProximal => "Thumb_Phalanx_Proximal",
            JointName::ThumbPhalanxDistal => "Thumb_Phalanx_Distal",
            JointName::ThumbTip => "Thumb_Tip",
            JointName::IndexMetacarpal => "Index_Metacarpal",
            JointName::IndexPhalanxProximal => "Index_Phalanx_Proximal",
            JointName::IndexPhalanxIntermediate => "Index_Phalanx_Intermediate",
            JointName::IndexPhalanxDistal => "Index_Phalanx_Distal",
            JointName::IndexTip => "Index_Tip",
            JointName::MiddleMetacarpal => "Middle_Metacarpal",
            JointName::MiddlePhalanxProximal => "Middle_Phalanx_Proximal",
            JointName::MiddlePhalanxIntermediate => "Middle_Phalanx_Intermediate",
            JointName::MiddlePhalanxDistal => "Middle_Phalanx_Distal",
            JointName::MiddleTip => "Middle_Tip",
            JointName::RingMetacarpal => "Ring_Metacarpal",
            JointName::RingPhalanxProximal => "Ring_Phalanx_Proximal",
            JointName::RingPhalanxIntermediate => "Ring_Phalanx_Intermediate",
            JointName::RingPhalanxDistal => "Ring_Phalanx_Distal",
            JointName::RingTip => "Ring_Tip",
            JointName::PinkyMetacarpal => "Pinky_Metacarpal",
            JointName::PinkyPhalanxProximal => "Pinky_Phalanx_Proximal",
            JointName::PinkyPhalanxIntermediate => "Pinky_Phalanx_Intermediate",
            JointName::PinkyPhalanxDistal => "Pinky_Phalanx_Distal",
            JointName::PinkyTip => "Pinky_Tip",
        }
    }
}

impl FromStr for JointName {
    type Err = JointError;

    /// Parses a canonical wire name. Anything outside the closed set is a
    /// programmer error and fails immediately.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointName::ALL
            .into_iter()
            .find(|name| name.label() == s)
            .ok_or_else(|| JointError::UnknownJoint(s.to_string()))
    }
}

/// One full hand pose: 25 joint transforms in canonical order.
///
/// The buffer is zeroed at construction and only ever overwritten whole. A
/// poll that produces no pose leaves it untouched, so readers either see
/// all zeroes or some complete, committed fill.
#[derive(Clone, Debug, PartialEq)]
pub struct JointSnapshot {
    data: [[f32; FLOATS_PER_JOINT]; JOINT_COUNT],
}

impl JointSnapshot {
    pub fn new() -> Self {
        Self {
            data: [[0.0; FLOATS_PER_JOINT]; JOINT_COUNT],
        }
    }

    /// Builds a snapshot from a flat 400-float slice.
    pub fn from_slice(values: &[f32]) -> Result<Self, JointError> {
        if values.len() != SNAPSHOT_LEN {
            return Err(JointError::BadLength { got: values.len() });
        }
        let mut snapshot = Self::new();
        snapshot.as_mut_slice().copy_from_slice(values);
        Ok(snapshot)
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data.as_flattened()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_flattened_mut()
    }

    /// Overwrites this buffer in place with another committed fill.
    pub fn copy_from(&mut self, other: &JointSnapshot) {
        self.data = other.data;
    }

    /// The joint's 16-float column-major transform.
    pub fn transform(&self, joint: JointName) -> &[f32; FLOATS_PER_JOINT] {
        &self.data[joint.index()]
    }

    pub fn matrix(&self, joint: JointName) -> Mat4 {
        Mat4::from_cols_array(self.transform(joint))
    }

    pub fn set_matrix(&mut self, joint: JointName, matrix: Mat4) {
        matrix.write_cols_to_slice(&mut self.data[joint.index()]);
    }

    /// The joint's position: the translation components of its transform,
    /// at offsets 12, 13 and 14 within the 16-float slice.
    pub fn position(&self, joint: JointName) -> Vec3 {
        let t = self.transform(joint);
        Vec3::new(t[12], t[13], t[14])
    }

    /// Writes the translation triplet, leaving rotation and scale alone.
    pub fn set_position(&mut self, joint: JointName, position: Vec3) {
        let t = &mut self.data[joint.index()];
        t[12] = position.x;
        t[13] = position.y;
        t[14] = position.z;
    }

    /// All joint positions in canonical order.
    pub fn positions(&self) -> [Vec3; JOINT_COUNT] {
        let mut out = [Vec3::ZERO; JOINT_COUNT];
        for (slot, name) in out.iter_mut().zip(JointName::ALL) {
            *slot = self.position(name);
        }
        out
    }
}

impl Default for JointSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_snapshot() -> JointSnapshot {
        let values: Vec<f32> = (0..SNAPSHOT_LEN).map(|i| i as f32).collect();
        JointSnapshot::from_slice(&values).unwrap()
    }

    #[test]
    fn canonical_order_is_dense() {
        for (i, name) in JointName::ALL.into_iter().enumerate() {
            assert_eq!(name.index(), i);
            assert_eq!(name.offset(), i * FLOATS_PER_JOINT);
        }
    }

    #[test]
    fn transform_matches_registered_offset() {
        let snapshot = counting_snapshot();
        for name in JointName::ALL {
            let transform = snapshot.transform(name);
            assert_eq!(transform.len(), FLOATS_PER_JOINT);
            let offset = name.offset();
            assert_eq!(
                transform.as_slice(),
                &snapshot.as_slice()[offset..offset + FLOATS_PER_JOINT]
            );
        }
    }

    #[test]
    fn thumb_tip_occupies_fifth_block() {
        let snapshot = counting_snapshot();
        assert_eq!(JointName::ThumbTip.offset(), 64);
        assert_eq!(snapshot.transform(JointName::ThumbTip)[0], 64.0);
        assert_eq!(snapshot.transform(JointName::ThumbTip)[15], 79.0);
    }

    #[test]
    fn position_reads_translation_components() {
        let snapshot = counting_snapshot();
        let offset = JointName::IndexTip.offset() as f32;
        assert_eq!(
            snapshot.position(JointName::IndexTip),
            Vec3::new(offset + 12.0, offset + 13.0, offset + 14.0)
        );
    }

    #[test]
    fn from_slice_rejects_bad_lengths() {
        assert!(matches!(
            JointSnapshot::from_slice(&[0.0; 399]),
            Err(JointError::BadLength { got: 399 })
        ));
        assert!(matches!(
            JointSnapshot::from_slice(&[]),
            Err(JointError::BadLength { got: 0 })
        ));
    }

    #[test]
    fn parses_canonical_labels_only() {
        assert_eq!("Thumb_Tip".parse::<JointName>().unwrap(), JointName::ThumbTip);
        assert_eq!("Wrist".parse::<JointName>().unwrap(), JointName::Wrist);
        assert!(matches!(
            "Thumb_Tipp".parse::<JointName>(),
            Err(JointError::UnknownJoint(_))
        ));
        assert!(matches!(
            "wrist".parse::<JointName>(),
            Err(JointError::UnknownJoint(_))
        ));
    }

    #[test]
    fn matrix_round_trips_through_set() {
        let mut snapshot = JointSnapshot::new();
        let matrix = Mat4::from_translation(Vec3::new(0.1, 1.2, -0.3));
        snapshot.set_matrix(JointName::MiddleTip, matrix);
        assert_eq!(snapshot.matrix(JointName::MiddleTip), matrix);
        assert_eq!(
            snapshot.position(JointName::MiddleTip),
            Vec3::new(0.1, 1.2, -0.3)
        );
    }
}
