use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossbeam_channel::bounded;
use glam::{Mat4, Vec3};

use xr_handtrack::{
    GestureCell, HandSession, Handedness, JointName, JointSnapshot, PinchClassifier,
    ReferenceFrame, SamplerConfig, SessionContext, SessionHandle, diagnostics,
    start_gesture_tracker, start_sampler,
};

/// Synthetic right hand whose thumb and index tips oscillate between a
/// closed pinch and an open spread, for exercising the pipeline without a
/// device attached.
struct ScriptedSession {
    started: Instant,
}

impl ScriptedSession {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl HandSession for ScriptedSession {
    fn is_active(&self) -> bool {
        true
    }

    fn request_pose(
        &mut self,
        _reference: &ReferenceFrame,
        commit: &mut dyn FnMut(Handedness, &JointSnapshot),
    ) -> Result<()> {
        // One pinch/open cycle every two seconds, tip spread 0..4 cm.
        let phase = self.started.elapsed().as_secs_f32() * std::f32::consts::PI;
        let spread = 0.04 * (0.5 - 0.5 * phase.cos());

        let mut joints = JointSnapshot::new();
        let place = |joints: &mut JointSnapshot, name: JointName, pos: Vec3| {
            joints.set_matrix(name, Mat4::from_translation(pos));
        };

        place(&mut joints, JointName::Wrist, Vec3::new(0.0, 1.00, -0.30));
        place(
            &mut joints,
            JointName::ThumbTip,
            Vec3::new(-spread / 2.0, 1.06, -0.24),
        );
        place(
            &mut joints,
            JointName::IndexTip,
            Vec3::new(spread / 2.0, 1.07, -0.23),
        );
        place(
            &mut joints,
            JointName::MiddleTip,
            Vec3::new(0.02, 1.08, -0.23),
        );
        place(
            &mut joints,
            JointName::RingTip,
            Vec3::new(0.04, 1.07, -0.24),
        );
        place(
            &mut joints,
            JointName::PinkyTip,
            Vec3::new(0.06, 1.06, -0.25),
        );

        commit(Handedness::Right, &joints);
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let context = SessionContext::new();
    let (update_tx, update_rx) = bounded(8);

    let sampler = start_sampler(context.clone(), SamplerConfig::default(), update_tx);

    let cell = GestureCell::new();
    let classifier = PinchClassifier::new(0.01);
    let tracker = start_gesture_tracker(
        update_rx,
        classifier,
        Some(Handedness::Right),
        cell.clone(),
    );

    // Log what the scripted hand looks like from above before wiring it in.
    let mut preview = ScriptedSession::new();
    preview.request_pose(&ReferenceFrame::new("local-floor"), &mut |hand, joints| {
        log::debug!(
            "{} hand layout:\n{}",
            hand.label(),
            diagnostics::render_top_down(joints, 40, 20)
        );
    })?;

    let session: SessionHandle = Arc::new(Mutex::new(ScriptedSession::new()));
    context.set_reference(Some(ReferenceFrame::new("local-floor")));
    context.set_session(Some(session));
    log::info!("scripted session installed, sampling for 4 seconds");

    for _ in 0..8 {
        thread::sleep(Duration::from_millis(500));
        let state = cell.get();
        log::info!(
            "gesture: neutral={} distance={:.3} m",
            state.neutral,
            state.distance
        );
    }

    context.clear();
    sampler.stop();
    let _ = tracker.join();
    log::info!("session ended, final state: {:?}", cell.get());

    Ok(())
}
