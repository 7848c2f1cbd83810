//! Key material and opaque token generation
//!
//! Access tokens are signed with a symmetric HS256 key; refresh tokens are
//! random opaque strings that are only ever persisted as Argon2 hashes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::RngCore;
use std::sync::Arc;

/// Number of random bytes in a refresh token
const REFRESH_TOKEN_BYTES: usize = 32;

/// Pre-built HS256 key pair for signing and verifying access tokens.
///
/// Building jsonwebtoken keys from raw bytes on every request is wasteful, so
/// both halves are derived once and shared behind an `Arc`.
#[derive(Clone)]
pub struct SigningKey {
    keys: Arc<KeyPair>,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    len: usize,
}

impl SigningKey {
    /// Minimum allowed key length in bytes (256 bits)
    pub const MIN_KEY_LENGTH: usize = 32;

    /// Create a signing key from secret bytes.
    ///
    /// # Errors
    /// Returns error if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SigningKeyError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_KEY_LENGTH {
            return Err(SigningKeyError::KeyTooShort {
                actual: secret.len(),
                minimum: Self::MIN_KEY_LENGTH,
            });
        }
        Ok(Self {
            keys: Arc::new(KeyPair {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                len: secret.len(),
            }),
        })
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.keys.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.keys.decoding
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_length", &self.keys.len)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating a signing key
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningKeyError {
    #[error("signing key too short: got {actual} bytes, need at least {minimum}")]
    KeyTooShort { actual: usize, minimum: usize },
}

/// Plaintext refresh token.
///
/// Handed to the client exactly once; the server keeps only its hash.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Generate a fresh random token from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token received from a client
    pub fn from_client(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The plaintext value
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}
