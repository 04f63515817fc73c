//! Wire envelopes exchanged with the page, and the binary-field
//! normalization passes applied to ceremony payloads.
//!
//! Inbound messages are JSON objects `{ "type": "create" | "get",
//! "request": { ... } }`. Outbound messages are always a 3-element JSON
//! array `["success", payload, kind]` or `["error", message, kind]`; the
//! page-side runtime pattern-matches on position 0 and dispatches the reply
//! to the pending promise selected by position 2, so this exact shape is a
//! wire-compatibility requirement.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};

use crate::base64url;
use crate::error::DecodeError;

/// The two credential ceremonies a page may request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CeremonyKind {
    /// Registration: create a new public-key credential.
    Create,
    /// Authentication: get an assertion from an existing credential.
    Get,
}

/// A decoded inbound request from the page.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Which ceremony the page is requesting.
    pub kind: CeremonyKind,
    /// The ceremony request payload, with binary fields as base64url text.
    pub payload: Value,
}

/// The single reply produced for an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    /// The ceremony completed; `payload` is the normalized credential
    /// response.
    Success {
        /// Echo of the originating request kind, used by the page to route
        /// the reply.
        kind: CeremonyKind,
        /// The ceremony response payload.
        payload: Value,
    },
    /// The ceremony was rejected or failed.
    Failure {
        /// Echo of the originating request kind.
        kind: CeremonyKind,
        /// Human-readable failure message.
        message: String,
    },
}

impl ResponseEnvelope {
    /// Builds a failure envelope from anything displayable.
    #[must_use]
    pub fn failure<M: ToString>(kind: CeremonyKind, message: &M) -> Self {
        Self::Failure {
            kind,
            message: message.to_string(),
        }
    }

    /// Serializes the envelope to its fixed 3-element wire array.
    #[must_use]
    pub fn encode(&self) -> String {
        let array = match self {
            Self::Success { kind, payload } => json!(["success", payload, kind]),
            Self::Failure { kind, message } => json!(["error", message, kind]),
        };
        array.to_string()
    }
}

/// Decodes an inbound page message into a [`RequestEnvelope`].
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if the message is not a JSON object with
/// `type` and `request` fields, or [`DecodeError::UnknownKind`] if the
/// discriminator names no known ceremony. Callers must not reply in either
/// case: the kind needed to address the reply is unavailable.
pub fn decode_request(raw: &str) -> Result<RequestEnvelope, DecodeError> {
    #[derive(Deserialize)]
    struct RawEnvelope {
        #[serde(rename = "type")]
        kind: String,
        request: Value,
    }

    let envelope: RawEnvelope = serde_json::from_str(raw)?;
    let kind = envelope
        .kind
        .parse::<CeremonyKind>()
        .map_err(|_| DecodeError::UnknownKind(envelope.kind))?;
    Ok(RequestEnvelope {
        kind,
        payload: envelope.request,
    })
}

/// Canonicalizes the binary fields of an inbound ceremony request.
///
/// Each field known to carry credential bytes is decoded (padding-tolerant)
/// and re-encoded unpadded, so the provider adapter always sees canonical
/// base64url text. Fields are normalized only when present: create and get
/// requests carry different optional fields.
///
/// # Errors
///
/// Returns a [`DecodeError`] if a present field is not a string or is not
/// valid base64url.
pub fn normalize_request(kind: CeremonyKind, payload: &mut Value) -> Result<(), DecodeError> {
    recode_field(payload, "challenge")?;
    match kind {
        CeremonyKind::Create => {
            if let Some(user) = payload.get_mut("user") {
                recode_field(user, "id")?;
            }
            recode_list_ids(payload, "excludeCredentials")?;
        }
        CeremonyKind::Get => {
            recode_list_ids(payload, "allowCredentials")?;
        }
    }
    Ok(())
}

/// Canonicalizes the binary fields of a ceremony response payload.
///
/// Covers every byte-carrying field the page-side runtime decodes: the raw
/// credential id, client-data JSON, attestation object, authenticator data,
/// signature and user handle. All are conditional; create and get responses
/// carry different subsets.
///
/// # Errors
///
/// Returns a [`DecodeError`] if a present field is not a string or is not
/// valid base64url.
pub fn normalize_response(payload: &mut Value) -> Result<(), DecodeError> {
    recode_field(payload, "rawId")?;
    if let Some(response) = payload.get_mut("response") {
        for field in [
            "clientDataJSON",
            "attestationObject",
            "authenticatorData",
            "signature",
            "userHandle",
        ] {
            recode_field(response, field)?;
        }
    }
    Ok(())
}

/// Re-encodes `object[field]` through the binary codec when present.
fn recode_field(object: &mut Value, field: &str) -> Result<(), DecodeError> {
    let Some(slot) = object.get_mut(field) else {
        return Ok(());
    };
    if slot.is_null() {
        return Ok(());
    }
    let Some(text) = slot.as_str() else {
        return Err(DecodeError::NotText {
            field: field.to_owned(),
        });
    };
    let bytes = base64url::decode(text).map_err(|source| DecodeError::Binary {
        field: field.to_owned(),
        source,
    })?;
    *slot = Value::String(base64url::encode(bytes));
    Ok(())
}

/// Re-encodes the `id` of every descriptor in `object[list]` when present.
fn recode_list_ids(object: &mut Value, list: &str) -> Result<(), DecodeError> {
    let Some(entries) = object.get_mut(list).and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for entry in entries {
        recode_field(entry, "id")?;
    }
    Ok(())
}
