use std::time::Instant;

use crate::joints::JointSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
    /// Reported by devices that expose a hand source without saying which
    /// hand it is.
    Unknown,
}

impl Handedness {
    pub const ALL: [Handedness; 3] = [Handedness::Left, Handedness::Right, Handedness::Unknown];

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
            Handedness::Unknown => "unknown",
        }
    }
}

/// Derived pinch state, recomputed from scratch on every snapshot. Holds no
/// history.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureState {
    /// Whether the two tracked fingertips are within the configured
    /// threshold of each other.
    pub neutral: bool,
    /// Fingertip separation in meters. 0.0 while no hand is tracked.
    pub distance: f32,
}

/// Per-hand event emitted by the frame sampler on each tick.
#[derive(Clone, Debug)]
pub enum JointUpdate {
    /// A whole-buffer pose fill for one hand.
    Pose {
        hand: Handedness,
        joints: JointSnapshot,
        timestamp: Instant,
    },
    /// The hand was tracked on an earlier tick and produced no pose this
    /// one. Gesture consumers must reset on this; others may keep their
    /// last-known state.
    Lost { hand: Handedness },
}

impl JointUpdate {
    pub fn hand(&self) -> Handedness {
        match self {
            JointUpdate::Pose { hand, .. } | JointUpdate::Lost { hand } => *hand,
        }
    }
}
