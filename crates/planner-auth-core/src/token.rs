//! Access token minting and validation
//!
//! Access tokens are compact HS256 JWTs. Validation checks the signature and
//! expiry only; whether the bound session is still active is a store
//! question answered by [`AuthService::authenticate`](crate::AuthService::authenticate).

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use planner_types::{Role, SessionBinding, SessionId, UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{AuthConfig, AuthError};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_name: String,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub session_id: SessionId,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Mints and validates access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    validation: Validation,
}

impl TokenIssuer {
    /// Create a new token issuer
    pub fn new(config: Arc<AuthConfig>) -> Self {
        // Only HS256 is accepted; a token announcing any other algorithm fails
        // before its signature is checked.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self { config, validation }
    }

    /// Mint a signed access token bound to `session_id`
    pub fn mint(&self, user: &UserProfile, session_id: SessionId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.config.access_token_duration.as_secs())
            .ok()
            .and_then(|lifetime| now.checked_add(lifetime))
            .ok_or_else(|| AuthError::Configuration("access token lifetime too large".into()))?;

        let claims = AccessClaims {
            user_name: user.user_name.clone(),
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            session_id,
            iat: now,
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            self.config.signing_key().encoding(),
        )
        .map_err(|e| {
            tracing::error!("Failed to sign access token: {}", e);
            AuthError::Internal("Failed to sign access token".to_string())
        })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessClaims>(token, self.config.signing_key().decoding(), &self.validation)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::InvalidSignature,
                }
            })?;

        Ok(data.claims)
    }

    /// Rebuild the partial user and session views carried by the claims.
    ///
    /// No store round-trip: callers needing authoritative state must look the
    /// user and session up themselves.
    pub fn extract_identity(claims: &AccessClaims) -> (UserProfile, SessionBinding) {
        let user = UserProfile {
            id: claims.user_id,
            user_name: claims.user_name.clone(),
            email: claims.email.clone(),
            role: claims.role,
        };
        let session = SessionBinding {
            session_id: claims.session_id,
            user_id: claims.user_id,
        };
        (user, session)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_token_duration", &self.config.access_token_duration)
            .finish_non_exhaustive()
    }
}
