//! Orchestration of the bridge: decode, gate, run the ceremony, reply.
//!
//! Nothing is allowed to throw past this layer. Every recoverable condition
//! becomes a `Failure` envelope on the requester's own channel; the one
//! exception is an undecodable inbound message, which is logged and dropped
//! because the kind needed to route a reply is unknown.

use std::sync::Arc;

use crate::error::BridgeError;
use crate::gate::{ReplyChannel, RequestGate};
use crate::origin::OriginPolicy;
use crate::protocol::{self, CeremonyKind, ResponseEnvelope};
use crate::provider::{CredentialProvider, ProviderError};

/// Surface for the transient, user-visible failure notification (a toast or
/// similar), owned by the embedding UI layer. Fired once per failure reply.
pub trait FailureNotifier: Send + Sync {
    /// Presents `message` to the user transiently.
    fn notify(&self, message: &str);
}

/// Receives raw page messages and drives ceremonies through the provider.
///
/// One controller instance owns the single-flight gate; inbound message
/// delivery is expected to be serialized by the embedding surface, and the
/// gate makes the admission transitions atomic regardless.
pub struct BridgeController {
    gate: RequestGate,
    policy: OriginPolicy,
    provider: Arc<dyn CredentialProvider>,
    notifier: Option<Arc<dyn FailureNotifier>>,
}

impl BridgeController {
    /// Creates a controller admitting any https main-frame origin.
    #[must_use]
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            gate: RequestGate::new(),
            policy: OriginPolicy::allow_any_https(),
            provider,
            notifier: None,
        }
    }

    /// Replaces the origin policy.
    #[must_use]
    pub fn with_origin_policy(mut self, policy: OriginPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Installs the transient failure notification surface.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// True while an admitted request has not yet replied.
    #[must_use]
    pub fn has_pending_request(&self) -> bool {
        self.gate.has_pending_request()
    }

    /// Signal that the surface began loading a new top-level page.
    ///
    /// Marks any in-flight ceremony as doomed; its reply will still be
    /// attempted on the possibly-orphaned channel.
    pub fn navigation_started(&self) {
        self.gate.navigation_started();
    }

    /// Services one raw inbound message from the page.
    ///
    /// Decodes the envelope, runs the busy and origin gates, admits the
    /// request, awaits the provider ceremony (the only suspension point)
    /// and delivers exactly one reply over `channel`. The exception is
    /// undecodable input, which is dropped without a reply.
    pub async fn handle_inbound(
        &self,
        raw: &str,
        source_origin: &str,
        is_main_frame: bool,
        channel: Box<dyn ReplyChannel>,
    ) {
        let envelope = match protocol::decode_request(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                // Unroutable: no valid kind to address a typed reply with.
                log::info!("dropping inbound message: {err}");
                return;
            }
        };
        let kind = envelope.kind;

        if self.gate.has_pending_request() {
            self.post_error(channel.as_ref(), kind, &BridgeError::AlreadyInProgress);
            return;
        }

        if let Err(denied) = self.policy.admit(source_origin, is_main_frame) {
            log::info!("{kind} request from {source_origin} denied: {denied:?}");
            self.post_error(channel.as_ref(), kind, &BridgeError::from(denied));
            return;
        }

        let session = match self.gate.admit(kind, channel) {
            Ok(session) => session,
            // Lost an admission race; identical to the synchronous busy path.
            Err(rejected) => {
                self.post_error(
                    rejected.channel.as_ref(),
                    rejected.kind,
                    &BridgeError::AlreadyInProgress,
                );
                return;
            }
        };

        let mut payload = envelope.payload;
        if let Err(err) = protocol::normalize_request(kind, &mut payload) {
            // The kind is known here, so unlike an undecodable envelope this
            // failure is routable back to the page.
            log::info!("rejecting {kind} request: {err}");
            self.notify_failure(&err.to_string());
            session.reply(&ResponseEnvelope::failure(kind, &err));
            return;
        }

        log::debug!("starting {kind} ceremony for {source_origin}");
        let result = match kind {
            CeremonyKind::Create => self.provider.create(payload).await,
            CeremonyKind::Get => self.provider.get(payload).await,
        };

        if session.is_doomed() {
            log::info!("page navigated during {kind} ceremony; replying anyway");
        }

        match result {
            Ok(mut payload) => match protocol::normalize_response(&mut payload) {
                Ok(()) => session.reply(&ResponseEnvelope::Success { kind, payload }),
                Err(err) => {
                    log::warn!("provider returned malformed {kind} response: {err}");
                    self.notify_failure(&err.to_string());
                    session.reply(&ResponseEnvelope::failure(kind, &err));
                }
            },
            Err(err) => {
                match &err {
                    ProviderError::Ceremony(ceremony) => {
                        log::info!("{kind} ceremony failed: {ceremony}");
                    }
                    ProviderError::Unexpected(detail) => {
                        log::warn!("unexpected {kind} ceremony failure: {detail}");
                    }
                }
                self.notify_failure(&err.to_string());
                session.reply(&ResponseEnvelope::failure(kind, &err));
            }
        }
    }

    /// Posts a failure reply for a request that never got a session.
    fn post_error(&self, channel: &dyn ReplyChannel, kind: CeremonyKind, error: &BridgeError) {
        let message = error.to_string();
        log::info!("replying to {kind} request with error: {message}");
        if let Err(err) = channel.send(&ResponseEnvelope::failure(kind, &message).encode()) {
            log::info!("dropping error reply for {kind} request: {err}");
        }
        self.notify_failure(&message);
    }

    fn notify_failure(&self, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(message);
        }
    }
}

impl std::fmt::Debug for BridgeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeController")
            .field("gate", &self.gate)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
