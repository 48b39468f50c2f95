use std::fmt;

use zeroize::Zeroizing;

use crate::error::{SignError, SignResult};

/// Shared secret used as the HMAC key.
///
/// Key bytes are zeroized on drop and never printed.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wrap raw key bytes. Empty keys are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> SignResult<Self> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(SignError::EmptyKey);
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl TryFrom<&str> for SecretKey {
    type Error = SignError;

    fn try_from(s: &str) -> SignResult<Self> {
        Self::new(s.as_bytes())
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = SignError;

    fn try_from(bytes: &[u8]) -> SignResult<Self> {
        Self::new(bytes)
    }
}

impl TryFrom<String> for SecretKey {
    type Error = SignError;

    fn try_from(s: String) -> SignResult<Self> {
        Self::new(s.into_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(len={}, [REDACTED])", self.bytes.len())
    }
}
