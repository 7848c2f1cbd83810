//! Session lifecycle
//!
//! One session per device fingerprint. The session owns the hash of the
//! current refresh token; the plaintext is handed back to the caller exactly
//! once, on creation or rotation.

use chrono::{DateTime, Utc};
use planner_db::{CreateSession, DbError, SessionRepository};
use planner_types::{Fingerprint, Session, SessionId, UserId};
use std::sync::Arc;

use crate::crypto::RefreshToken;
use crate::hasher::CredentialHasher;
use crate::{AuthConfig, AuthError};

/// First session whose fingerprint equals `fingerprint`
///
/// Linear scan; a user has a handful of devices at most.
pub fn match_fingerprint<'a>(
    sessions: &'a [Session],
    fingerprint: &Fingerprint,
) -> Option<&'a Session> {
    sessions.iter().find(|s| &s.fingerprint == fingerprint)
}

/// Session manager handles session creation, rotation and deactivation
#[derive(Clone)]
pub struct SessionManager<R: SessionRepository> {
    repo: Arc<R>,
    hasher: CredentialHasher,
    config: Arc<AuthConfig>,
}

impl<R: SessionRepository> SessionManager<R> {
    /// Create a new session manager
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            hasher: CredentialHasher::new(config.hash_params.clone()),
            repo,
            config,
        }
    }

    /// Expiry for a session created or rotated now
    pub fn next_expiry(&self) -> Result<DateTime<Utc>, AuthError> {
        chrono::Duration::from_std(self.config.refresh_token_duration)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::Configuration("refresh token lifetime too large".into()))
    }

    /// Create a new active session and return its id with the plaintext
    /// refresh token
    pub async fn create_session(
        &self,
        user_id: UserId,
        fingerprint: &Fingerprint,
    ) -> Result<(SessionId, RefreshToken), AuthError> {
        let session_id = SessionId::new();
        let refresh_token = RefreshToken::generate();
        let refresh_token_hash = self.hasher.hash(refresh_token.expose()).await?;

        let create = CreateSession {
            id: session_id.0,
            user_id: user_id.0,
            refresh_token_hash,
            expires_at: self.next_expiry()?,
            user_agent: fingerprint.user_agent.clone(),
            ip_address: fingerprint.ip_address.clone(),
        };

        self.repo.create(create).await.map_err(|e| {
            tracing::error!(%user_id, "Failed to create session: {}", e);
            AuthError::from(e)
        })?;

        tracing::info!(%user_id, %session_id, "Session created");
        Ok((session_id, refresh_token))
    }

    /// Get a session by ID
    pub async fn find_by_id(&self, session_id: SessionId) -> Result<Session, AuthError> {
        self.repo
            .find_by_id(session_id.0)
            .await?
            .map(Session::from)
            .ok_or(AuthError::NotFound)
    }

    /// Every session of a user, active or not
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Session>, AuthError> {
        let rows = self.repo.find_by_user_id(user_id.0).await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    /// Active sessions of a user, in no particular order
    pub async fn find_active_by_user(&self, user_id: UserId) -> Result<Vec<Session>, AuthError> {
        let rows = self.repo.find_active_by_user_id(user_id.0).await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    /// Replace the refresh token of a session and push its expiry to
    /// `new_expiry`. Returns the new plaintext token.
    pub async fn rotate_token(
        &self,
        session_id: SessionId,
        new_expiry: DateTime<Utc>,
    ) -> Result<RefreshToken, AuthError> {
        if self.repo.find_by_id(session_id.0).await?.is_none() {
            return Err(AuthError::NotFound);
        }

        let refresh_token = RefreshToken::generate();
        let refresh_token_hash = self.hasher.hash(refresh_token.expose()).await?;

        self.repo
            .update_token(session_id.0, &refresh_token_hash, new_expiry)
            .await
            .map_err(|e| {
                tracing::error!(%session_id, "Failed to rotate refresh token: {}", e);
                AuthError::from(e)
            })?;

        tracing::info!(%session_id, "Refresh token rotated");
        Ok(refresh_token)
    }

    /// Check a presented refresh token against the session's stored hash
    pub async fn verify_refresh_token(
        &self,
        session: &Session,
        refresh_token: &RefreshToken,
    ) -> Result<bool, AuthError> {
        self.hasher
            .verify(refresh_token.expose(), &session.refresh_token_hash)
            .await
    }

    /// Mark a session inactive
    ///
    /// # Errors
    /// `NoRowsAffected` if the session is unknown or already inactive.
    pub async fn deactivate(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.repo.deactivate(session_id.0).await?;
        tracing::info!(%session_id, "Session deactivated");
        Ok(())
    }

    /// Log out every other device of a user, keeping `keep` active
    ///
    /// # Errors
    /// `NoRowsAffected` if there was nothing else to deactivate.
    pub async fn deactivate_all_except(
        &self,
        user_id: UserId,
        keep: SessionId,
    ) -> Result<u64, AuthError> {
        let count = self.repo.deactivate_all_except(user_id.0, keep.0).await?;
        tracing::info!(%user_id, kept = %keep, count, "Other sessions deactivated");
        Ok(count)
    }

    /// Hard-delete every inactive session; returns how many were removed
    pub async fn purge_inactive(&self) -> Result<u64, AuthError> {
        match self.repo.delete_inactive().await {
            Ok(count) => {
                tracing::info!(count, "Purged inactive sessions");
                Ok(count)
            }
            Err(DbError::NoRowsAffected) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: SessionRepository> std::fmt::Debug for SessionManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_token_duration", &self.config.refresh_token_duration)
            .finish_non_exhaustive()
    }
}
