//! The seam to the device layer: the session trait the sampler polls, and
//! the shared context that distributes the live session and reference frame
//! to every consumer.

use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::{joints::JointSnapshot, types::Handedness};

/// Opaque coordinate origin established by the device layer. The core never
/// inspects it beyond its label; it only threads it back through pose
/// requests so the device can express joint transforms against it.
#[derive(Clone, Debug)]
pub struct ReferenceFrame {
    label: String,
}

impl ReferenceFrame {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A live device tracking session.
///
/// The session's lifetime is owned by the device layer; the core holds a
/// non-owning handle that stays valid until the session ends.
pub trait HandSession: Send {
    /// Whether the device still considers this session live.
    fn is_active(&self) -> bool;

    /// Issues exactly one pose request. For every hand the delivered frame
    /// tracks, `commit` is invoked once with that hand's 25 joint
    /// transforms expressed in `reference` coordinates. A hand whose
    /// tracking is lost is simply not committed; partial fills never reach
    /// the callback.
    fn request_pose(
        &mut self,
        reference: &ReferenceFrame,
        commit: &mut dyn FnMut(Handedness, &JointSnapshot),
    ) -> anyhow::Result<()>;
}

pub type SessionHandle = Arc<Mutex<dyn HandSession>>;

/// Mirror of the external session lifecycle. Both fields may be absent at
/// any time, including immediately after the context is created.
#[derive(Clone, Default)]
pub struct SessionState {
    pub session: Option<SessionHandle>,
    pub reference: Option<ReferenceFrame>,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        self.session.is_some() && self.reference.is_some()
    }
}

/// Shared session context: an explicit observable state holder.
///
/// Setters mirror device lifecycle events (session acquired, session ended,
/// reference space established) and push the whole new state to every
/// subscriber. Each subscriber holds a single-slot channel: publishing
/// evicts whatever the subscriber has not consumed yet before writing the
/// new state, so even a subscriber that never drains observes only the
/// newest value. Unsubscribing is dropping the receiver.
pub struct SessionContext {
    inner: Mutex<ContextInner>,
}

struct Subscriber {
    tx: Sender<SessionState>,
    /// Publish-side handle to the subscriber's slot, used to evict a stale
    /// unconsumed state so the slot always holds the newest.
    evict: Receiver<SessionState>,
}

#[derive(Default)]
struct ContextInner {
    state: SessionState,
    subscribers: Vec<Subscriber>,
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ContextInner::default()),
        })
    }

    pub fn current(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Registers a subscriber, primed with the current state.
    pub fn subscribe(&self) -> Receiver<SessionState> {
        let (tx, rx) = bounded(1);
        let mut inner = self.lock();
        let _ = tx.try_send(inner.state.clone());
        inner.subscribers.push(Subscriber {
            tx,
            evict: rx.clone(),
        });
        rx
    }

    pub fn set_session(&self, session: Option<SessionHandle>) {
        let mut inner = self.lock();
        inner.state.session = session;
        Self::publish(&mut inner);
    }

    pub fn set_reference(&self, reference: Option<ReferenceFrame>) {
        let mut inner = self.lock();
        inner.state.reference = reference;
        Self::publish(&mut inner);
    }

    /// Drops both fields in a single update, the session-ended transition.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.state = SessionState::default();
        Self::publish(&mut inner);
    }

    fn publish(inner: &mut ContextInner) {
        let state = inner.state.clone();
        inner.subscribers.retain(|sub| {
            // Only the eviction handle left: the subscriber dropped out.
            if sub.tx.receiver_count() <= 1 {
                return false;
            }
            // Newest wins: clear a stale unconsumed state, then refill.
            let _ = sub.evict.try_recv();
            let _ = sub.tx.try_send(state.clone());
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drains `events` so `state` reflects the newest published value.
pub fn drain_state(events: &Receiver<SessionState>, state: &mut SessionState) {
    while let Ok(next) = events.try_recv() {
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    struct IdleSession;

    impl HandSession for IdleSession {
        fn is_active(&self) -> bool {
            true
        }

        fn request_pose(
            &mut self,
            _reference: &ReferenceFrame,
            _commit: &mut dyn FnMut(Handedness, &JointSnapshot),
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn starts_empty() {
        let context = SessionContext::new();
        let state = context.current();
        assert!(state.session.is_none());
        assert!(state.reference.is_none());
        assert!(!state.is_ready());
    }

    #[test]
    fn subscribe_primes_with_current_state() {
        let context = SessionContext::new();
        context.set_reference(Some(ReferenceFrame::new("local-floor")));

        let events = context.subscribe();
        let state = events.try_recv().unwrap();
        assert_eq!(state.reference.unwrap().label(), "local-floor");
        assert!(state.session.is_none());
    }

    #[test]
    fn drain_observes_newest_state() {
        let context = SessionContext::new();
        let events = context.subscribe();

        context.set_reference(Some(ReferenceFrame::new("viewer")));
        context.set_reference(Some(ReferenceFrame::new("local-floor")));
        let session: SessionHandle = Arc::new(Mutex::new(IdleSession));
        context.set_session(Some(session));

        let mut state = SessionState::default();
        drain_state(&events, &mut state);
        assert!(state.is_ready());
        assert_eq!(state.reference.unwrap().label(), "local-floor");
    }

    #[test]
    fn slow_subscriber_sees_only_the_newest_state() {
        let context = SessionContext::new();
        let events = context.subscribe();
        // Consume the primed initial state.
        events.try_recv().unwrap();

        context.set_reference(Some(ReferenceFrame::new("viewer")));
        context.set_reference(Some(ReferenceFrame::new("local-floor")));

        // Without draining in between, a single read still observes the
        // newest state; the stale intermediate was evicted, not queued.
        let state = events.try_recv().unwrap();
        assert_eq!(state.reference.unwrap().label(), "local-floor");
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn clear_drops_both_fields() {
        let context = SessionContext::new();
        let session: SessionHandle = Arc::new(Mutex::new(IdleSession));
        context.set_session(Some(session));
        context.set_reference(Some(ReferenceFrame::new("local-floor")));
        assert!(context.current().is_ready());

        context.clear();
        let state = context.current();
        assert!(state.session.is_none());
        assert!(state.reference.is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let context = SessionContext::new();
        let events = context.subscribe();
        drop(events);
        // Must not error or wedge with a dead subscriber in the list.
        context.set_reference(Some(ReferenceFrame::new("local-floor")));
        assert!(context.current().reference.is_some());
    }
}
