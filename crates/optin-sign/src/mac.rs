//! Keyed-hash capability used by the token codec.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{SignError, SignResult};
use crate::key::SecretKey;

type HmacSha256Inner = Hmac<Sha256>;

/// Computes a message authentication code over a message with a secret key.
pub trait MacProvider: Send + Sync {
    fn compute(&self, key: &SecretKey, message: &[u8]) -> SignResult<Vec<u8>>;
}

/// HMAC-SHA256, producing a 32-byte tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl MacProvider for HmacSha256 {
    fn compute(&self, key: &SecretKey, message: &[u8]) -> SignResult<Vec<u8>> {
        let mut mac = HmacSha256Inner::new_from_slice(key.as_bytes())
            .map_err(|e| SignError::Crypto(format!("hmac key rejected: {}", e)))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl<M: MacProvider + ?Sized> MacProvider for &M {
    fn compute(&self, key: &SecretKey, message: &[u8]) -> SignResult<Vec<u8>> {
        (**self).compute(key, message)
    }
}
