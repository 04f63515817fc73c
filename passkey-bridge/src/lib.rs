//! Consumer-facing surface of the passkey bridge.
//!
//! Re-exports everything an embedding host needs from
//! [`passkey_bridge_core`]: the [`BridgeController`] entry point, the
//! [`CredentialProvider`] / [`ReplyChannel`] / [`FailureNotifier`] seams the
//! host implements, the injected [`page_runtime`], and the error types.

pub use passkey_bridge_core::*;
