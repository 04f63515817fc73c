//! Single-flight admission for credential ceremonies.
//!
//! The platform ceremony is a modal, user-attention-grabbing operation that
//! cannot be cancelled or parallelized, so the gate admits at most one
//! request at a time and rejects (never queues) the rest. The admitted
//! request is represented by a [`BridgeSession`] owning the one-shot reply
//! capability; replying consumes the session, which is how exactly-once
//! delivery is enforced.

use std::sync::Mutex;

use thiserror::Error;

use crate::protocol::{CeremonyKind, ResponseEnvelope};

/// Delivery failure from a [`ReplyChannel`].
///
/// Send failures are expected when the page has navigated away from under an
/// in-flight ceremony; callers log them and never propagate or retry.
#[derive(Debug, Error)]
#[error("reply channel send failed: {0}")]
pub struct SendError(
    /// Reason reported by the embedding surface.
    pub String,
);

/// The one-shot sink over which a reply reaches the page.
///
/// Implemented by the embedding surface (e.g. wrapping a JavaScript reply
/// proxy). A trait seam rather than a concrete type so tests can observe
/// replies without a real surface.
pub trait ReplyChannel: Send + Sync {
    /// Delivers one serialized reply envelope to the page.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] if the underlying channel is gone, e.g.
    /// orphaned by navigation.
    fn send(&self, message: &str) -> Result<(), SendError>;
}

/// Lifecycle of the single outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// No ceremony in flight; the only state that admits.
    Idle,
    /// One ceremony in flight.
    Pending,
    /// One ceremony in flight, but the page has navigated since it started.
    /// The ceremony cannot be cancelled; the eventual reply is still
    /// attempted on the (possibly orphaned) channel.
    Doomed,
}

/// The single-flight state machine guarding ceremony admission.
///
/// All transitions (admit, reply, dooming) happen under one mutex, so a
/// racing inbound message and an adapter completion can never observe or
/// create two sessions.
#[derive(Debug)]
pub struct RequestGate {
    state: Mutex<GateState>,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestGate {
    /// Creates a gate in the `Idle` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
        }
    }

    /// True while an admitted request has not yet replied.
    #[must_use]
    pub fn has_pending_request(&self) -> bool {
        *self.lock() != GateState::Idle
    }

    /// Admits a request, creating the session bound to `channel`.
    ///
    /// This is the only transition that creates a session, and it is an
    /// atomic check-and-set: when a ceremony is already in flight the
    /// channel is handed back so the caller can post the busy failure
    /// without touching the in-flight session.
    ///
    /// # Errors
    ///
    /// Returns [`RejectedRequest`] when the gate is not idle.
    pub fn admit(
        &self,
        kind: CeremonyKind,
        channel: Box<dyn ReplyChannel>,
    ) -> Result<BridgeSession<'_>, RejectedRequest> {
        let mut state = self.lock();
        if *state != GateState::Idle {
            return Err(RejectedRequest { kind, channel });
        }
        *state = GateState::Pending;
        drop(state);
        Ok(BridgeSession {
            gate: self,
            kind,
            channel,
        })
    }

    /// Marks the in-flight ceremony as doomed by a new top-level page load.
    ///
    /// Callable at any time: a no-op while idle, idempotent while doomed.
    pub fn navigation_started(&self) {
        let mut state = self.lock();
        if *state == GateState::Pending {
            *state = GateState::Doomed;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        // State transitions never panic while holding the lock; recover the
        // guard rather than poisoning the whole bridge.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// A request refused admission because a ceremony is already in flight.
pub struct RejectedRequest {
    /// Kind of the rejected request, for tagging the busy reply.
    pub kind: CeremonyKind,
    /// The rejected request's own reply channel, for posting the busy reply.
    pub channel: Box<dyn ReplyChannel>,
}

/// The single outstanding-request record.
///
/// Holds the reply capability exclusively until [`BridgeSession::reply`]
/// consumes it; at most one session exists at any time. Dropping a session
/// without replying leaves the gate non-idle, mirroring the reference
/// behavior for a ceremony that never returns.
pub struct BridgeSession<'g> {
    gate: &'g RequestGate,
    kind: CeremonyKind,
    channel: Box<dyn ReplyChannel>,
}

impl BridgeSession<'_> {
    /// Kind of the admitted request.
    #[must_use]
    pub const fn kind(&self) -> CeremonyKind {
        self.kind
    }

    /// True if the page has navigated since this session was admitted.
    #[must_use]
    pub fn is_doomed(&self) -> bool {
        *self.gate.lock() == GateState::Doomed
    }

    /// Sends the session's one reply and returns the gate to idle.
    ///
    /// Consuming `self` makes a second reply unrepresentable. The send is
    /// attempted even for doomed sessions; a send failure is logged and
    /// swallowed, since an orphaned channel is expected after navigation.
    pub fn reply(self, envelope: &ResponseEnvelope) {
        if let Err(err) = self.channel.send(&envelope.encode()) {
            log::info!("dropping reply for {} ceremony: {err}", self.kind);
        }
        *self.gate.lock() = GateState::Idle;
    }
}

impl std::fmt::Debug for BridgeSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSession")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RejectedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectedRequest")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
