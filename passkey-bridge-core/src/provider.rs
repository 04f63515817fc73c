//! The credential provider adapter seam.
//!
//! The bridge never touches the platform credential store directly. The
//! embedding host supplies a [`CredentialProvider`] that runs the actual
//! create/get ceremony (key generation, biometric prompt, attestation) and
//! resolves with a normalized response payload or a typed failure. The
//! ceremony is user-paced and may suspend for an unbounded time.

use async_trait::async_trait;
use serde_json::Value;
use strum::Display;
use thiserror::Error;

/// Performs credential ceremonies on behalf of the bridge.
///
/// Request and response payloads are ceremony-shaped JSON with all binary
/// fields already in canonical base64url text form.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Runs a registration ("create") ceremony.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the ceremony fails or is refused.
    async fn create(&self, request: Value) -> Result<Value, ProviderError>;

    /// Runs an authentication ("get") ceremony.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the ceremony fails or is refused.
    async fn get(&self, request: Value) -> Result<Value, ProviderError>;
}

/// The closed set of recognized ceremony failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CeremonyErrorKind {
    /// The user intentionally dismissed the ceremony.
    Cancelled,
    /// Transient interruption; the caller may retry the whole request.
    Interrupted,
    /// The host is missing its credential provider configuration.
    Misconfigured,
    /// A WebAuthn-spec DOM error raised by the ceremony.
    Dom,
    /// A custom failure surfaced by a third-party provider SDK.
    CustomThirdParty,
    /// Recognized as a ceremony failure, but of no more specific class.
    Unknown,
}

/// A typed failure from a credential ceremony.
///
/// The wire contract flattens all ceremony failures to one `Failure` shape;
/// the kind survives in the message text and in local logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Error: {message} w type: {kind}")]
pub struct CeremonyError {
    /// Failure class, matched exhaustively at the boundary.
    pub kind: CeremonyErrorKind,
    /// Human-readable detail from the platform ceremony.
    pub message: String,
}

impl CeremonyError {
    /// Builds a typed ceremony failure.
    #[must_use]
    pub fn new<M: Into<String>>(kind: CeremonyErrorKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a user-cancellation failure.
    #[must_use]
    pub fn cancelled<M: Into<String>>(message: M) -> Self {
        Self::new(CeremonyErrorKind::Cancelled, message)
    }
}

/// Everything a provider adapter may fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A recognized ceremony failure class.
    #[error(transparent)]
    Ceremony(#[from] CeremonyError),
    /// Any other failure; logged with full detail, replied with the
    /// best-available message.
    #[error("Error: {0}")]
    Unexpected(String),
}
