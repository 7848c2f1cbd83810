//! Configuration types for auth service

use argon2::Params;
use std::time::Duration;

use crate::crypto::SigningKey;
use crate::AuthError;

/// Auth configuration
///
/// Built once at startup and shared read-only (behind an `Arc`) by the token
/// issuer and the session manager.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens
    signing_key: SigningKey,
    /// Access token lifetime
    pub access_token_duration: Duration,
    /// Refresh token (session) lifetime
    pub refresh_token_duration: Duration,
    /// Argon2id cost used for new password and refresh-token hashes
    pub hash_params: Params,
}

impl AuthConfig {
    /// Create a new auth config from the JWT secret
    ///
    /// # Errors
    /// Returns `Configuration` if the secret is shorter than 32 bytes.
    pub fn try_new(jwt_secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        Ok(Self {
            signing_key: SigningKey::new(jwt_secret)?,
            access_token_duration: Duration::from_secs(60 * 60), // 1 hour
            refresh_token_duration: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            hash_params: Params::default(),
        })
    }

    /// Signing key for access tokens
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Set access token lifetime
    pub fn with_access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_token_duration(mut self, duration: Duration) -> Self {
        self.refresh_token_duration = duration;
        self
    }

    /// Set Argon2 cost parameters
    pub fn with_hash_params(mut self, params: Params) -> Self {
        self.hash_params = params;
        self
    }
}
