use thiserror::Error;

use crate::origin::OriginDenied;
use crate::provider::{CeremonyError, ProviderError};

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error outputs from the passkey bridge.
///
/// The `Display` form of each variant is the exact message placed in the
/// wire `Failure` envelope when the variant is replied to the page.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The inbound message could not be decoded. Never replied to the page:
    /// without a valid request kind there is no way to route the reply.
    #[error("malformed inbound message: {0}")]
    Decode(#[from] DecodeError),
    /// A ceremony is already in flight; concurrent requests are rejected,
    /// not queued.
    #[error("The request already in progress")]
    AlreadyInProgress,
    /// The request failed the origin/frame gate.
    #[error("{0}")]
    OriginDenied(#[from] OriginDenied),
    /// The provider adapter failed the ceremony.
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl From<CeremonyError> for BridgeError {
    fn from(err: CeremonyError) -> Self {
        Self::Provider(ProviderError::Ceremony(err))
    }
}

/// Failure modes for decoding an inbound page message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The message is not valid JSON or is missing a required field.
    #[error("invalid request json: {0}")]
    Json(#[from] serde_json::Error),
    /// The `type` discriminator names no known ceremony.
    #[error("unknown request type `{0}`")]
    UnknownKind(String),
    /// A field that must carry base64url-encoded bytes failed to decode.
    #[error("invalid base64url in `{field}`: {source}")]
    Binary {
        /// Path of the offending field within the payload.
        field: String,
        /// The underlying alphabet/length failure.
        source: base64::DecodeError,
    },
    /// A field that must carry base64url-encoded bytes is not a JSON string.
    #[error("expected base64url text in `{field}`")]
    NotText {
        /// Path of the offending field within the payload.
        field: String,
    },
}
