//! End-to-end bridge scenarios: raw page message in, wire reply out.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use passkey_bridge_core::{
    BridgeController, CeremonyError, CeremonyErrorKind, CredentialProvider, FailureNotifier,
    OriginPolicy, ProviderError, ReplyChannel, SendError,
};

const ORIGIN: &str = "https://relying-party.example";

/// Reply channel that records everything sent over it.
struct PageChannel {
    sent: Arc<Mutex<Vec<String>>>,
}

impl PageChannel {
    fn new() -> (Box<dyn ReplyChannel>, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(Self {
                sent: Arc::clone(&sent),
            }),
            sent,
        )
    }
}

impl ReplyChannel for PageChannel {
    fn send(&self, message: &str) -> Result<(), SendError> {
        self.sent.lock().expect("lock").push(message.to_owned());
        Ok(())
    }
}

fn replies(sent: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    sent.lock().expect("lock").clone()
}

/// Provider that resolves immediately with a canned response.
struct CannedProvider {
    response: Value,
}

impl CannedProvider {
    fn boxed(response: Value) -> Arc<dyn CredentialProvider> {
        Arc::new(Self { response })
    }
}

#[async_trait]
impl CredentialProvider for CannedProvider {
    async fn create(&self, _request: Value) -> Result<Value, ProviderError> {
        Ok(self.response.clone())
    }

    async fn get(&self, _request: Value) -> Result<Value, ProviderError> {
        Ok(self.response.clone())
    }
}

/// Provider that parks the ceremony until the test releases it.
struct GatedProvider {
    started: Notify,
    release: Notify,
    response: Value,
}

impl GatedProvider {
    fn new(response: Value) -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            response,
        })
    }

    async fn run(&self) -> Result<Value, ProviderError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.response.clone())
    }
}

#[async_trait]
impl CredentialProvider for GatedProvider {
    async fn create(&self, _request: Value) -> Result<Value, ProviderError> {
        self.run().await
    }

    async fn get(&self, _request: Value) -> Result<Value, ProviderError> {
        self.run().await
    }
}

/// Provider that always fails with the given error.
struct FailingProvider {
    error: fn() -> ProviderError,
}

#[async_trait]
impl CredentialProvider for FailingProvider {
    async fn create(&self, _request: Value) -> Result<Value, ProviderError> {
        Err((self.error)())
    }

    async fn get(&self, _request: Value) -> Result<Value, ProviderError> {
        Err((self.error)())
    }
}

struct ToastRecorder {
    messages: Mutex<Vec<String>>,
}

impl FailureNotifier for ToastRecorder {
    fn notify(&self, message: &str) {
        self.messages.lock().expect("lock").push(message.to_owned());
    }
}

// Scenario A: create request with adapter success.
#[tokio::test]
async fn test_create_success_round_trip() {
    let provider = CannedProvider::boxed(json!({
        "id": "Zm9v",
        "rawId": "Zm9v",
        "response": {"clientDataJSON": "Zm8=", "attestationObject": "Zg=="},
    }));
    let controller = BridgeController::new(provider);
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(
            r#"{"type":"create","request":{"challenge":"AAA"}}"#,
            ORIGIN,
            true,
            channel,
        )
        .await;

    let replies = replies(&sent);
    assert_eq!(replies.len(), 1);
    let reply: Value = serde_json::from_str(&replies[0]).expect("reply json");
    assert_eq!(reply[0], "success");
    assert_eq!(reply[2], "create");
    // Response binary fields come back canonicalized (unpadded).
    assert_eq!(reply[1]["response"]["clientDataJSON"], "Zm8");
    assert_eq!(reply[1]["response"]["attestationObject"], "Zg");
    assert!(!controller.has_pending_request());
}

// Scenario B: a second request while the first ceremony is suspended.
#[tokio::test]
async fn test_second_request_rejected_first_still_resolves() {
    let provider = GatedProvider::new(json!({"rawId": "AAAA", "response": {}}));
    let controller = Arc::new(BridgeController::new(provider.clone()));
    let (first_channel, first_sent) = PageChannel::new();
    let (second_channel, second_sent) = PageChannel::new();

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller
                .handle_inbound(
                    r#"{"type":"create","request":{}}"#,
                    ORIGIN,
                    true,
                    first_channel,
                )
                .await;
        }
    });
    provider.started.notified().await;
    assert!(controller.has_pending_request());

    // Rejected synchronously, before the first ceremony resolves.
    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, true, second_channel)
        .await;
    assert_eq!(
        replies(&second_sent),
        vec![r#"["error","The request already in progress","get"]"#.to_owned()]
    );
    assert!(replies(&first_sent).is_empty());

    provider.release.notify_one();
    first.await.expect("first task");

    let first_replies = replies(&first_sent);
    assert_eq!(first_replies.len(), 1);
    let reply: Value = serde_json::from_str(&first_replies[0]).expect("reply json");
    assert_eq!(reply[0], "success");
    assert_eq!(reply[2], "create");
    assert!(!controller.has_pending_request());
}

// Scenario C: subframe requests are never serviced.
#[tokio::test]
async fn test_subframe_request_denied() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({})));
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, false, channel)
        .await;

    assert_eq!(
        replies(&sent),
        vec![r#"["error","Requests from subframes are not supported","get"]"#.to_owned()]
    );
    assert!(!controller.has_pending_request());
}

// Scenario D: http origins are denied.
#[tokio::test]
async fn test_insecure_origin_denied() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({})));
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(
            r#"{"type":"create","request":{}}"#,
            "http://relying-party.example",
            true,
            channel,
        )
        .await;

    assert_eq!(
        replies(&sent),
        vec![r#"["error","WebAuthn not permitted for current URL","create"]"#.to_owned()]
    );
}

#[tokio::test]
async fn test_undecodable_message_gets_no_reply() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({})));

    let (channel, sent) = PageChannel::new();
    controller
        .handle_inbound("this is not json", ORIGIN, true, channel)
        .await;
    assert!(replies(&sent).is_empty());

    let (channel, sent) = PageChannel::new();
    controller
        .handle_inbound(r#"{"type":"attest","request":{}}"#, ORIGIN, true, channel)
        .await;
    assert!(replies(&sent).is_empty());

    // The bridge stays serviceable afterwards.
    assert!(!controller.has_pending_request());
}

#[tokio::test]
async fn test_navigation_during_ceremony_still_replies() {
    let provider = GatedProvider::new(json!({"rawId": "AAAA", "response": {}}));
    let controller = Arc::new(BridgeController::new(provider.clone()));
    let (channel, sent) = PageChannel::new();

    let pending = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller
                .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, true, channel)
                .await;
        }
    });
    provider.started.notified().await;

    controller.navigation_started();
    provider.release.notify_one();
    pending.await.expect("task");

    // Doomed sessions still deliver their reply.
    let replies = replies(&sent);
    assert_eq!(replies.len(), 1);
    let reply: Value = serde_json::from_str(&replies[0]).expect("reply json");
    assert_eq!(reply[0], "success");
    assert!(!controller.has_pending_request());
}

#[tokio::test]
async fn test_navigation_while_idle_is_noop() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({"rawId": "AA"})));
    controller.navigation_started();
    assert!(!controller.has_pending_request());

    // A request after the no-op proceeds normally.
    let (channel, sent) = PageChannel::new();
    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, true, channel)
        .await;
    assert_eq!(replies(&sent).len(), 1);
}

#[tokio::test]
async fn test_typed_ceremony_failure_flattens_to_wire_failure() {
    let controller = BridgeController::new(Arc::new(FailingProvider {
        error: || {
            ProviderError::Ceremony(CeremonyError::new(
                CeremonyErrorKind::Cancelled,
                "user dismissed the prompt",
            ))
        },
    }));
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(r#"{"type":"create","request":{}}"#, ORIGIN, true, channel)
        .await;

    assert_eq!(
        replies(&sent),
        vec![
            r#"["error","Error: user dismissed the prompt w type: cancelled","create"]"#
                .to_owned()
        ]
    );
    assert!(!controller.has_pending_request());
}

#[tokio::test]
async fn test_unexpected_failure_replies_with_best_available_message() {
    let controller = BridgeController::new(Arc::new(FailingProvider {
        error: || ProviderError::Unexpected("adapter fell over".to_owned()),
    }));
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, true, channel)
        .await;

    assert_eq!(
        replies(&sent),
        vec![r#"["error","Error: adapter fell over","get"]"#.to_owned()]
    );
}

#[tokio::test]
async fn test_failure_replies_fire_the_notifier() {
    let toasts = Arc::new(ToastRecorder {
        messages: Mutex::new(Vec::new()),
    });
    let controller = BridgeController::new(CannedProvider::boxed(json!({})))
        .with_notifier(toasts.clone());
    let (channel, _) = PageChannel::new();

    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, false, channel)
        .await;

    assert_eq!(
        *toasts.messages.lock().expect("lock"),
        vec!["Requests from subframes are not supported".to_owned()]
    );
}

#[tokio::test]
async fn test_origin_allowlist_pins_the_bridge() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({"rawId": "AA"})))
        .with_origin_policy(OriginPolicy::allow_listed([ORIGIN]));

    let (channel, sent) = PageChannel::new();
    controller
        .handle_inbound(r#"{"type":"get","request":{}}"#, ORIGIN, true, channel)
        .await;
    let allowed: Value =
        serde_json::from_str(&replies(&sent)[0]).expect("reply json");
    assert_eq!(allowed[0], "success");

    let (channel, sent) = PageChannel::new();
    controller
        .handle_inbound(
            r#"{"type":"get","request":{}}"#,
            "https://evil.example",
            true,
            channel,
        )
        .await;
    assert_eq!(
        replies(&sent),
        vec![r#"["error","WebAuthn not permitted for current URL","get"]"#.to_owned()]
    );
}

#[tokio::test]
async fn test_malformed_binary_field_is_replied_not_dropped() {
    let controller = BridgeController::new(CannedProvider::boxed(json!({})));
    let (channel, sent) = PageChannel::new();

    controller
        .handle_inbound(
            r#"{"type":"create","request":{"challenge":"+/+/"}}"#,
            ORIGIN,
            true,
            channel,
        )
        .await;

    let replies = replies(&sent);
    assert_eq!(replies.len(), 1);
    let reply: Value = serde_json::from_str(&replies[0]).expect("reply json");
    assert_eq!(reply[0], "error");
    assert_eq!(reply[2], "create");
    assert!(!controller.has_pending_request());
}
