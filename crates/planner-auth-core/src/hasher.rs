//! Argon2id hashing for passwords and refresh tokens
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`) with a per-hash random
//! salt. Hashing is CPU-bound, so the async entry points move the work onto
//! the blocking thread pool.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

use crate::AuthError;

/// Salted one-way hasher shared by the password and refresh-token paths
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with explicit Argon2id cost parameters
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret on the calling thread
    pub fn hash_blocking(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Failed to hash secret: {}", e);
                AuthError::Internal("Failed to hash secret".to_string())
            })
    }

    /// Verify a secret against a stored PHC hash on the calling thread.
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only if the stored hash
    /// cannot be parsed.
    pub fn verify_blocking(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored hash is malformed: {}", e);
            AuthError::Internal("Stored hash is malformed".to_string())
        })?;
        // Cost parameters are read from the PHC string, not from `self`.
        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hash a secret on the blocking pool
    pub async fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let hasher = self.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&secret))
            .await
            .map_err(|e| {
                tracing::error!("Hashing task failed: {}", e);
                AuthError::Internal("Hashing task failed".to_string())
            })?
    }

    /// Verify a secret on the blocking pool
    pub async fn verify(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.clone();
        let secret = secret.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&secret, &hash))
            .await
            .map_err(|e| {
                tracing::error!("Verification task failed: {}", e);
                AuthError::Internal("Verification task failed".to_string())
            })?
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialHasher {
        CredentialHasher::new(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hasher = cheap();
        let hash = hasher.hash_blocking("123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_blocking("123", &hash).unwrap());
        assert!(!hasher.verify_blocking("1234", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap();
        let a = hasher.hash_blocking("same-secret").unwrap();
        let b = hasher.hash_blocking("same-secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let result = cheap().verify_blocking("123", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_async_hash_verify() {
        let hasher = cheap();
        let hash = hasher.hash("oleg-password").await.unwrap();
        assert!(hasher.verify("oleg-password", &hash).await.unwrap());
        assert!(!hasher.verify("wrong", &hash).await.unwrap());
    }
}
