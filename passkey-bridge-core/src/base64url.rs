//! URL-safe base64 codec for credential binary fields.
//!
//! Every binary field crossing the bridge (challenges, credential ids,
//! signatures, attestation blobs) is carried as base64url text because the
//! transport is text-only. Output is always unpadded; input is accepted with
//! or without padding, since pages differ on which form they produce.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine};

/// Unpadded-encoding, padding-tolerant-decoding URL-safe engine.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes as unpadded base64url text.
pub fn encode<T: AsRef<[u8]>>(bytes: T) -> String {
    ENGINE.encode(bytes)
}

/// Decodes base64url text, tolerating trailing `=` padding.
///
/// # Errors
///
/// Returns an error if the input contains bytes outside the URL-safe
/// alphabet (notably `+` and `/`) or has an invalid length.
pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    ENGINE.decode(text)
}
