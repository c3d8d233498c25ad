//! Soft real-time polling of the active session: one pose request per tick,
//! whole-buffer commits into the joint store, per-hand updates pushed to
//! consumers.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::anyhow;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::{
    joints::JointSnapshot,
    session::{self, ReferenceFrame, SessionContext, SessionHandle, SessionState},
    types::{Handedness, JointUpdate},
};

#[derive(Clone, Copy, Debug)]
pub struct SamplerConfig {
    /// Poll cadence. One pose request is issued per tick; the tick blocks
    /// on it, so at most one request is ever outstanding.
    pub interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

/// Latest committed pose buffers, one per reported handedness.
///
/// Each handedness keeps its own buffer, so two tracked hands never
/// clobber each other. Buffers are only overwritten whole; a poll that
/// yields nothing for a hand leaves that hand's buffer exactly as the
/// previous commit left it.
#[derive(Debug, Default)]
pub struct JointStore {
    slots: [StoreSlot; 3],
}

#[derive(Debug, Default)]
struct StoreSlot {
    joints: JointSnapshot,
    committed: bool,
    tracked: bool,
}

fn slot_index(hand: Handedness) -> usize {
    match hand {
        Handedness::Left => 0,
        Handedness::Right => 1,
        Handedness::Unknown => 2,
    }
}

impl JointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the hand's buffer in place with a complete fill and marks
    /// the hand tracked.
    pub fn commit(&mut self, hand: Handedness, joints: &JointSnapshot) {
        let slot = &mut self.slots[slot_index(hand)];
        slot.joints.copy_from(joints);
        slot.committed = true;
        slot.tracked = true;
    }

    /// The hand's latest committed snapshot, or `None` before the first
    /// commit. Stays available (stale) after tracking is lost.
    pub fn get(&self, hand: Handedness) -> Option<&JointSnapshot> {
        let slot = &self.slots[slot_index(hand)];
        slot.committed.then_some(&slot.joints)
    }

    /// Whether the most recent poll committed this hand.
    pub fn tracked(&self, hand: Handedness) -> bool {
        self.slots[slot_index(hand)].tracked
    }

    /// Marks the hand untracked, returning true the first time after a
    /// commit. The buffer itself is retained.
    pub fn mark_lost(&mut self, hand: Handedness) -> bool {
        let slot = &mut self.slots[slot_index(hand)];
        let was_tracked = slot.tracked;
        slot.tracked = false;
        was_tracked
    }
}

/// Handle to the sampling worker. Stops and joins on `stop` or drop.
#[derive(Debug)]
pub struct FrameSampler {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameSampler {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn start_sampler(
    context: Arc<SessionContext>,
    config: SamplerConfig,
    update_tx: Sender<JointUpdate>,
) -> FrameSampler {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        run_sampler_loop(context, config, update_tx, stop_flag);
    });

    FrameSampler {
        stop,
        handle: Some(handle),
    }
}

enum Poll {
    Sampled,
    Inactive,
}

fn run_sampler_loop(
    context: Arc<SessionContext>,
    config: SamplerConfig,
    update_tx: Sender<JointUpdate>,
    stop: Arc<AtomicBool>,
) {
    let events = context.subscribe();
    let mut state = context.current();
    let mut store = JointStore::new();
    let mut pending_lost = [false; 3];

    log::info!("sampler started, interval {:?}", config.interval);

    while !stop.load(Ordering::Relaxed) {
        flush_pending_lost(&update_tx, &mut pending_lost);
        session::drain_state(&events, &mut state);

        // No session or no reference frame: sampling is suspended. No poll
        // is issued until the context changes.
        let (Some(session), Some(reference)) =
            (state.session.clone(), state.reference.clone())
        else {
            report_all_lost(&mut store, &update_tx, &mut pending_lost);
            if !park(&events, &mut state, config.interval) {
                break;
            }
            continue;
        };

        let tick_start = Instant::now();
        let mut batch: Vec<(Handedness, JointSnapshot)> = Vec::new();

        match poll_once(&session, &reference, &mut batch) {
            Ok(Poll::Sampled) => {}
            Ok(Poll::Inactive) => {
                report_all_lost(&mut store, &update_tx, &mut pending_lost);
                if !park(&events, &mut state, config.interval) {
                    break;
                }
                continue;
            }
            Err(err) => {
                // Treated as a no-data poll; recovery is the next tick.
                log::warn!("pose request failed: {err:?}");
                batch.clear();
            }
        }

        // The request may have outlived its session: drop the result if the
        // context cleared while it was in flight, or stop was requested.
        session::drain_state(&events, &mut state);
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if !state.is_ready() {
            batch.clear();
        }

        let timestamp = Instant::now();
        let mut committed = [false; 3];
        for (hand, joints) in &batch {
            store.commit(*hand, joints);
            committed[slot_index(*hand)] = true;
        }

        for hand in Handedness::ALL {
            if committed[slot_index(hand)] {
                // Re-tracked: a still-undelivered lost report is now stale.
                pending_lost[slot_index(hand)] = false;
                if let Some(joints) = store.get(hand) {
                    // Slow consumers drop poses rather than stall the loop;
                    // a newer pose supersedes anything dropped here.
                    let _ = update_tx.try_send(JointUpdate::Pose {
                        hand,
                        joints: joints.clone(),
                        timestamp,
                    });
                }
            } else if store.mark_lost(hand) {
                send_lost(&update_tx, &mut pending_lost, hand);
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < config.interval && !park(&events, &mut state, config.interval - elapsed) {
            break;
        }
    }

    log::info!("sampler stopped");
}

fn poll_once(
    session: &SessionHandle,
    reference: &ReferenceFrame,
    batch: &mut Vec<(Handedness, JointSnapshot)>,
) -> anyhow::Result<Poll> {
    let mut guard = session
        .lock()
        .map_err(|_| anyhow!("hand session mutex poisoned"))?;
    if !guard.is_active() {
        return Ok(Poll::Inactive);
    }
    guard.request_pose(reference, &mut |hand, joints| {
        batch.push((hand, joints.clone()));
    })?;
    Ok(Poll::Sampled)
}

fn report_all_lost(
    store: &mut JointStore,
    update_tx: &Sender<JointUpdate>,
    pending: &mut [bool; 3],
) {
    for hand in Handedness::ALL {
        if store.mark_lost(hand) {
            send_lost(update_tx, pending, hand);
        }
    }
}

/// A lost report is a one-shot reset and is never superseded by a later
/// update, so a full channel defers it instead of dropping it.
fn send_lost(update_tx: &Sender<JointUpdate>, pending: &mut [bool; 3], hand: Handedness) {
    log::debug!("{} hand tracking lost", hand.label());
    pending[slot_index(hand)] = update_tx.try_send(JointUpdate::Lost { hand }).is_err();
}

/// Retries deferred lost reports until the consumer frees a slot.
fn flush_pending_lost(update_tx: &Sender<JointUpdate>, pending: &mut [bool; 3]) {
    for hand in Handedness::ALL {
        if pending[slot_index(hand)] {
            pending[slot_index(hand)] = update_tx.try_send(JointUpdate::Lost { hand }).is_err();
        }
    }
}

/// Parks on the context subscription so session changes wake the loop
/// early. Returns false only if the context went away entirely.
fn park(events: &Receiver<SessionState>, state: &mut SessionState, timeout: Duration) -> bool {
    match events.recv_timeout(timeout) {
        Ok(next) => {
            *state = next;
            true
        }
        Err(RecvTimeoutError::Timeout) => true,
        Err(RecvTimeoutError::Disconnected) => false,
    }
}
