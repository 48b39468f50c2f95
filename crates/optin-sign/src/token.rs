//! Token shape: `<encodedPayload>.<tag>`.
//!
//! Both halves are standard base64 with padding. The token carries no
//! algorithm identifier, timestamp, or version.

use base64::alphabet;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::attributes::AttributeMap;
use crate::error::{SignError, SignResult};

/// Standard alphabet, padding optional. Reads what browser and Node
/// decoders accept.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Separator between the encoded payload and the tag.
pub const SEPARATOR: char = '.';

/// Borrowed view of a token split on its first separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub payload: &'a str,
    pub tag: &'a str,
}

impl<'a> TokenParts<'a> {
    /// Split on the first `.`; the tag is everything after it.
    ///
    /// Returns `None` when the separator is missing or either half is empty.
    pub fn split(token: &'a str) -> Option<Self> {
        let (payload, tag) = token.split_once(SEPARATOR)?;
        if payload.is_empty() || tag.is_empty() {
            return None;
        }
        Some(Self { payload, tag })
    }

    /// Decode the payload half into attributes. Does not check the tag.
    pub fn decode_payload(&self) -> SignResult<AttributeMap> {
        let json = decode_base64(self.payload)?;
        AttributeMap::from_json_slice(&json)
    }
}

/// Base64 of the compact JSON encoding of `attributes`.
pub fn encode_payload(attributes: &AttributeMap) -> SignResult<String> {
    let json = attributes.to_json()?;
    Ok(BASE64.encode(json.as_bytes()))
}

pub(crate) fn encode_tag(tag: &[u8]) -> String {
    BASE64.encode(tag)
}

pub(crate) fn is_base64(s: &str) -> bool {
    BASE64.decode(s).is_ok()
}

pub(crate) fn decode_base64(s: &str) -> SignResult<Vec<u8>> {
    BASE64
        .decode(s)
        .map_err(|e| SignError::MalformedToken(format!("payload is not base64: {}", e)))
}

/// Decode padded or unpadded base64 in either the standard or URL-safe
/// alphabet. Only for reading unverified payloads; `verify` stays strict.
pub(crate) fn decode_base64_lenient(s: &str) -> SignResult<Vec<u8>> {
    let normalized: String = s
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    LENIENT
        .decode(normalized)
        .map_err(|e| SignError::MalformedToken(format!("payload is not base64: {}", e)))
}
