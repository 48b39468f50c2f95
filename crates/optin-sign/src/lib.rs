//! # optin-sign
//!
//! Signed user-properties tokens for opt-in and consent flows. A flat map
//! of user attributes is serialized to JSON, base64-encoded, and tagged with
//! HMAC-SHA256 under a shared secret:
//!
//! ```text
//! base64(json(attributes)) "." base64(HMAC-SHA256(key, encodedPayload))
//! ```
//!
//! Three primitives cover the round trip:
//!
//! - [`sign`]: Produce a token from attributes and a key.
//! - [`verify`]: Yes/no check of a token against a key. Never errors.
//! - [`open`]: Verify, then decode the attributes back out.
//!
//! [`UserProperties`] handles the consent-provider side: pulling the
//! `userId` out of pre-signed properties and encoding properties for the
//! backend request.
//!
//! # Example
//!
//! ```rust
//! use optin_sign::{sign, verify, AttributeMap, SecretKey};
//!
//! let key = SecretKey::try_from("secret").unwrap();
//! let attributes = AttributeMap::new().with("userId", "u-42").with("plan", "pro");
//!
//! let token = sign(&attributes, &key).unwrap();
//! assert!(verify(&token, &key));
//! ```
//!
//! Key order matters: the tag covers the JSON text exactly as serialized, so
//! the same attributes inserted in a different order produce a different
//! token.

pub mod attributes;
pub mod codec;
pub mod error;
pub mod key;
pub mod mac;
pub mod token;
pub mod user_properties;

pub use attributes::{AttributeMap, AttributeValue};
pub use codec::TokenCodec;
pub use error::{SignError, SignResult};
pub use key::SecretKey;
pub use mac::{HmacSha256, MacProvider};
pub use token::TokenParts;
pub use user_properties::{resolve_user_id, UserProperties, USER_ID_ATTRIBUTE};

/// Sign `attributes` with `key` using HMAC-SHA256.
pub fn sign(attributes: &AttributeMap, key: &SecretKey) -> SignResult<String> {
    TokenCodec::new().sign(attributes, key)
}

/// Check `token` against `key`. Malformed input is `false`, never an error.
pub fn verify(token: &str, key: &SecretKey) -> bool {
    TokenCodec::new().verify(token, key)
}

/// Verify `token` and return its attributes.
pub fn open(token: &str, key: &SecretKey) -> SignResult<AttributeMap> {
    TokenCodec::new().open(token, key)
}
