//! Keyed-hash primitive and signature encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;

use crate::error::{SignerError, SignerResult};

type HmacSha1Mac = Hmac<Sha1>;

/// A keyed hash over a message, such as HMAC.
///
/// The signer shares one instance across all of its calls, so implementations
/// must not keep per-call state between invocations.
pub trait KeyedHash: Send + Sync {
    /// Compute the digest of `message` keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Digest`] if the digest cannot be computed.
    fn calculate(&self, message: &[u8], key: &[u8]) -> SignerResult<Vec<u8>>;
}

/// HMAC-SHA1, the SigV2 signing primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1;

impl KeyedHash for HmacSha1 {
    fn calculate(&self, message: &[u8], key: &[u8]) -> SignerResult<Vec<u8>> {
        let mut mac =
            HmacSha1Mac::new_from_slice(key).map_err(|e| SignerError::Digest(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Encode a digest as standard, padded base64.
#[must_use]
pub fn encode_signature(digest: &[u8]) -> String {
    BASE64.encode(digest)
}
