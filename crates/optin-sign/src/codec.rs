//! Signed-token codec.
//!
//! Sign flow:
//! 1. Serialize the attribute map to compact JSON in insertion order.
//! 2. Base64 the UTF-8 bytes to get the encoded payload.
//! 3. MAC the ASCII bytes of the encoded payload and base64 the tag.
//! 4. Join as `<payload>.<tag>`.
//!
//! Verification recomputes the tag over the payload half and compares it to
//! the supplied tag in constant time. Malformed tokens, wrong keys and
//! tampered payloads are indistinguishable to the caller: all yield `false`.

use subtle::ConstantTimeEq;

use crate::attributes::AttributeMap;
use crate::error::{SignError, SignResult};
use crate::key::SecretKey;
use crate::mac::{HmacSha256, MacProvider};
use crate::token::{self, TokenParts, SEPARATOR};

/// Stateless codec over an injected MAC capability.
#[derive(Debug, Clone, Default)]
pub struct TokenCodec<M = HmacSha256> {
    mac: M,
}

impl TokenCodec<HmacSha256> {
    /// Codec using HMAC-SHA256.
    pub fn new() -> Self {
        Self { mac: HmacSha256 }
    }
}

impl<M: MacProvider> TokenCodec<M> {
    /// Codec using a caller-supplied MAC provider.
    pub fn with_mac(mac: M) -> Self {
        Self { mac }
    }

    /// Sign `attributes` with `key`, producing `<payload>.<tag>`.
    pub fn sign(&self, attributes: &AttributeMap, key: &SecretKey) -> SignResult<String> {
        if key.is_empty() {
            return Err(SignError::EmptyKey);
        }
        let payload = token::encode_payload(attributes)?;
        let tag = self.tag(&payload, key)?;

        tracing::debug!(
            attributes = attributes.len(),
            payload_len = payload.len(),
            "signed attribute map"
        );

        let mut signed = String::with_capacity(payload.len() + 1 + tag.len());
        signed.push_str(&payload);
        signed.push(SEPARATOR);
        signed.push_str(&tag);
        Ok(signed)
    }

    /// Check that `signed` carries a valid tag for `key`.
    ///
    /// Never fails: any malformed input is reported as `false`.
    pub fn verify(&self, signed: &str, key: &SecretKey) -> bool {
        let Some(parts) = TokenParts::split(signed) else {
            tracing::debug!("token rejected: missing payload or tag");
            return false;
        };
        if !token::is_base64(parts.payload) {
            tracing::debug!("token rejected: payload is not base64");
            return false;
        }
        let expected = match self.tag(parts.payload, key) {
            Ok(tag) => tag,
            Err(e) => {
                tracing::debug!(error = %e, "token rejected: tag computation failed");
                return false;
            }
        };

        let valid: bool = expected.as_bytes().ct_eq(parts.tag.as_bytes()).into();
        if !valid {
            tracing::debug!("token rejected: tag mismatch");
        }
        valid
    }

    /// Verify `signed` and decode its attributes.
    pub fn open(&self, signed: &str, key: &SecretKey) -> SignResult<AttributeMap> {
        if !self.verify(signed, key) {
            return Err(SignError::InvalidSignature);
        }
        TokenParts::split(signed)
            .ok_or(SignError::InvalidSignature)?
            .decode_payload()
    }

    fn tag(&self, payload: &str, key: &SecretKey) -> SignResult<String> {
        let raw = self.mac.compute(key, payload.as_bytes())?;
        Ok(token::encode_tag(&raw))
    }
}
