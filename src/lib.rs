//! Hand-joint pose sampling and pinch gesture detection over a device
//! session layer.
//!
//! Data flows one way: a [`SessionContext`] distributes the live session
//! and reference frame, [`start_sampler`] polls that session at a fixed
//! cadence and commits whole 25-joint pose buffers per hand, and the
//! resulting [`JointUpdate`] stream feeds [`start_gesture_tracker`], which
//! keeps a shared [`GestureCell`] current for presentation consumers.

pub mod diagnostics;
pub mod gesture;
pub mod joints;
pub mod sampler;
pub mod session;
pub mod types;

pub use gesture::{GestureCell, PinchClassifier, start_gesture_tracker};
pub use joints::{JOINT_COUNT, JointError, JointName, JointSnapshot, SNAPSHOT_LEN};
pub use sampler::{FrameSampler, JointStore, SamplerConfig, start_sampler};
pub use session::{HandSession, ReferenceFrame, SessionContext, SessionHandle, SessionState};
pub use types::{GestureState, Handedness, JointUpdate};
