//! Pinch/neutral classification and the shared gesture state consumers
//! read.

use std::{
    sync::{Arc, Mutex},
    thread,
};

use crossbeam_channel::Receiver;

use crate::{
    joints::{JointName, JointSnapshot},
    types::{GestureState, Handedness, JointUpdate},
};

/// Classifies a hand as neutral when two designated joints sit within a
/// distance threshold of each other.
///
/// The threshold is in meters: the maximum separation still treated as the
/// resting / pinch-closed pose. It is always supplied by the caller; what
/// counts as "close" depends on the joint pair and the experience.
#[derive(Clone, Copy, Debug)]
pub struct PinchClassifier {
    a: JointName,
    b: JointName,
    threshold: f32,
}

impl PinchClassifier {
    /// Thumb-tip to index-tip pinch, the usual pairing.
    pub fn new(threshold: f32) -> Self {
        Self::between(JointName::ThumbTip, JointName::IndexTip, threshold)
    }

    pub fn between(a: JointName, b: JointName, threshold: f32) -> Self {
        Self { a, b, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pure and synchronous. A missing snapshot (no hand tracked) is never
    /// neutral, regardless of any earlier result.
    pub fn classify(&self, snapshot: Option<&JointSnapshot>) -> GestureState {
        let Some(joints) = snapshot else {
            return GestureState {
                neutral: false,
                distance: 0.0,
            };
        };

        let distance = joints.position(self.a).distance(joints.position(self.b));
        GestureState {
            neutral: distance <= self.threshold,
            distance,
        }
    }
}

/// Cloneable cell holding the latest derived gesture state for
/// presentation consumers.
#[derive(Clone, Default)]
pub struct GestureCell {
    inner: Arc<Mutex<GestureState>>,
}

impl GestureCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> GestureState {
        self.inner.lock().map(|state| *state).unwrap_or_default()
    }

    fn set(&self, state: GestureState) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = state;
        }
    }
}

/// Spawns the worker that folds sampler updates into `cell`.
///
/// `hand_filter` picks which hand drives the state: `Some(hand)` pins one
/// hand, `None` accepts any hand with the last accepted update winning.
/// `Lost` updates from an accepted hand reset the cell to not-neutral. The
/// worker exits when the update channel disconnects.
pub fn start_gesture_tracker(
    update_rx: Receiver<JointUpdate>,
    classifier: PinchClassifier,
    hand_filter: Option<Handedness>,
    cell: GestureCell,
) -> thread::JoinHandle<()> {
    thread::spawn(move || run_tracker_loop(update_rx, classifier, hand_filter, cell))
}

fn run_tracker_loop(
    update_rx: Receiver<JointUpdate>,
    classifier: PinchClassifier,
    hand_filter: Option<Handedness>,
    cell: GestureCell,
) {
    while let Ok(update) = update_rx.recv() {
        if let Some(hand) = hand_filter {
            if update.hand() != hand {
                continue;
            }
        }

        let state = match &update {
            JointUpdate::Pose { joints, .. } => classifier.classify(Some(joints)),
            JointUpdate::Lost { .. } => classifier.classify(None),
        };

        let previous = cell.get();
        if previous.neutral != state.neutral {
            log::info!(
                "{} hand gesture now {} (distance {:.4} m)",
                update.hand().label(),
                if state.neutral { "neutral" } else { "open" },
                state.distance,
            );
        }
        cell.set(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::Vec3;

    fn snapshot_with_tips(thumb: Vec3, index: Vec3) -> JointSnapshot {
        let mut joints = JointSnapshot::new();
        joints.set_position(JointName::ThumbTip, thumb);
        joints.set_position(JointName::IndexTip, index);
        joints
    }

    #[test]
    fn missing_snapshot_is_never_neutral() {
        for threshold in [0.0, 0.001, 0.01, 0.05, 1.0] {
            let state = PinchClassifier::new(threshold).classify(None);
            assert!(!state.neutral);
            assert_eq!(state.distance, 0.0);
        }
    }

    #[test]
    fn close_tips_within_threshold_are_neutral() {
        let joints = snapshot_with_tips(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.005));
        let state = PinchClassifier::new(0.01).classify(Some(&joints));
        assert!(state.neutral);
        assert!((state.distance - 0.005).abs() < 1e-6);
    }

    #[test]
    fn same_tips_fail_a_tighter_threshold() {
        let joints = snapshot_with_tips(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.005));
        let state = PinchClassifier::new(0.001).classify(Some(&joints));
        assert!(!state.neutral);
    }

    #[test]
    fn distance_equal_to_threshold_is_neutral() {
        // The boundary is inclusive.
        let joints = snapshot_with_tips(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.01));
        let state = PinchClassifier::new(0.01).classify(Some(&joints));
        assert!(state.neutral);
    }

    #[test]
    fn classification_is_symmetric_in_the_joint_pair() {
        let joints = snapshot_with_tips(Vec3::new(0.1, 0.2, 0.3), Vec3::new(0.3, 0.1, 0.2));
        let forward = PinchClassifier::between(JointName::ThumbTip, JointName::IndexTip, 0.05)
            .classify(Some(&joints));
        let reversed = PinchClassifier::between(JointName::IndexTip, JointName::ThumbTip, 0.05)
            .classify(Some(&joints));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn classification_is_idempotent() {
        let joints = snapshot_with_tips(Vec3::ZERO, Vec3::new(0.02, 0.0, 0.0));
        let classifier = PinchClassifier::new(0.01);
        let first = classifier.classify(Some(&joints));
        let second = classifier.classify(Some(&joints));
        assert_eq!(first, second);
    }

    #[test]
    fn other_joint_pairs_are_supported() {
        let mut joints = JointSnapshot::new();
        joints.set_position(JointName::ThumbTip, Vec3::ZERO);
        joints.set_position(JointName::MiddleTip, Vec3::new(0.0, 0.003, 0.0));
        let classifier = PinchClassifier::between(JointName::ThumbTip, JointName::MiddleTip, 0.01);
        assert!(classifier.classify(Some(&joints)).neutral);
    }

    #[test]
    fn cell_defaults_to_not_neutral() {
        let cell = GestureCell::new();
        let state = cell.get();
        assert!(!state.neutral);
        assert_eq!(state.distance, 0.0);
    }
}
