//! Wire encoding helpers
//!
//! Pure functions over the `namespace:action:version:payload:signature`
//! layout. No key material or clock access happens here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared_types::TokenPayload;

use crate::error::{TokenError, TokenRejection};

/// Segment separator.
pub const SEPARATOR: char = ':';

/// Random nonce length (characters).
pub const NONCE_LEN: usize = 6;

/// Minimum number of segments in a well-formed token.
pub const MIN_SEGMENTS: usize = 5;

/// Borrowed view of the five token segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    pub namespace: &'a str,
    pub action: &'a str,
    pub version: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    /// Split a raw token. Anything past the fifth segment is ignored.
    pub fn split(token: &'a str) -> Result<Self, TokenRejection> {
        let mut parts = token.split(SEPARATOR);
        let mut next = || parts.next();

        match (next(), next(), next(), next(), next()) {
            (Some(namespace), Some(action), Some(version), Some(payload), Some(signature)) => {
                Ok(Self {
                    namespace,
                    action,
                    version,
                    payload,
                    signature,
                })
            }
            _ => Err(TokenRejection::Malformed("expected at least 5 segments")),
        }
    }

    /// The canonical unsigned prefix the signature covers.
    pub fn signing_input(&self) -> String {
        signing_input(self.namespace, self.action, self.version, self.payload)
    }
}

/// `namespace:action:version:payload`
pub fn signing_input(namespace: &str, action: &str, version: &str, payload: &str) -> String {
    let mut input =
        String::with_capacity(namespace.len() + action.len() + version.len() + payload.len() + 3);
    input.push_str(namespace);
    input.push(SEPARATOR);
    input.push_str(action);
    input.push(SEPARATOR);
    input.push_str(version);
    input.push(SEPARATOR);
    input.push_str(payload);
    input
}

/// Reject empty segments and segments that would break the layout.
pub fn check_segment(field: &'static str, value: &str) -> Result<(), TokenError> {
    if value.is_empty() || value.contains(SEPARATOR) {
        return Err(TokenError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// JSON-serialize and base64url-encode a payload.
pub fn encode_payload(payload: &TokenPayload) -> Result<String, TokenError> {
    let json =
        serde_json::to_vec(payload).map_err(|e| TokenError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Inverse of [`encode_payload`].
pub fn decode_payload(encoded: &str) -> Result<TokenPayload, TokenRejection> {
    let json = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenRejection::Malformed("payload is not base64url"))?;
    serde_json::from_slice(&json)
        .map_err(|_| TokenRejection::Malformed("payload is not valid JSON"))
}

/// Fresh random nonce.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
