//! Session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Device fingerprint: the (user agent, IP address) pair that identifies
/// "the same device" across logins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub user_agent: String,
    pub ip_address: String,
}

impl Fingerprint {
    pub fn new(user_agent: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ip_address: ip_address.into(),
        }
    }
}

/// Persisted session bound to one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Argon2 hash of the current refresh token
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub fingerprint: Fingerprint,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the refresh window has passed
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Active and not expired
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

/// Session view reconstructed from an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBinding {
    pub session_id: SessionId,
    pub user_id: UserId,
}
