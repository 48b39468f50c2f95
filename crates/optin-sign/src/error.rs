use thiserror::Error;

/// Errors that can occur while signing, opening, or inspecting tokens.
///
/// `verify` never surfaces these; it collapses every failure to `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    /// The secret key was empty. Signing with it would produce a token that
    /// anyone can forge.
    #[error("secret key must not be empty")]
    EmptyKey,

    /// An attribute value is outside {string, number, boolean, null}.
    #[error("unsupported value for attribute '{key}': {kind}")]
    UnsupportedValue { key: String, kind: &'static str },

    /// A float attribute was NaN or infinite.
    #[error("non-finite number: {0}")]
    NonFiniteNumber(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The token did not carry a valid tag for the supplied key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token does not have the `<payload>.<tag>` shape or its payload
    /// is not base64-encoded JSON.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The keyed-hash primitive refused its input.
    #[error("crypto operation failed: {0}")]
    Crypto(String),

    /// Signed user properties decoded fine but carry no usable `userId`.
    #[error("`userId` is missing in the signed user properties")]
    MissingUserId,
}

impl From<serde_json::Error> for SignError {
    fn from(e: serde_json::Error) -> Self {
        SignError::Serialization(e.to_string())
    }
}

/// Convenience result type for codec operations.
pub type SignResult<T> = Result<T, SignError>;
