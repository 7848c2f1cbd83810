//! Auth service - ties together credentials, sessions and access tokens

use planner_db::{CreateUser, SessionRepository, UserRepository, UserRow};
use planner_types::{Fingerprint, Role, Session, SessionBinding, SessionId, User, UserId, UserProfile};
use std::sync::{Arc, OnceLock};
use tracing::{field, Instrument, Span};

use crate::{
    config::AuthConfig,
    crypto::RefreshToken,
    hasher::CredentialHasher,
    session::{match_fingerprint, SessionManager},
    token::TokenIssuer,
    AuthError,
};

/// Where a request stands in the authentication flow
///
/// Only ever recorded on the tracing span; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Registering,
    LoggingIn,
    Authenticated,
    Rejected,
}

impl AuthFlow {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registering => "registering",
            Self::LoggingIn => "logging_in",
            Self::Authenticated => "authenticated",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    /// Plaintext refresh token; only its hash is stored
    pub refresh_token: RefreshToken,
    pub session: Session,
}

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub refresh_token: RefreshToken,
    pub session: Session,
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Registration and password-checked account changes
/// - Login with per-device session reuse
/// - Access token validation, optionally re-checked against the store
/// - Session administration (logout, logout other devices, purge)
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    config: Arc<AuthConfig>,
    token_issuer: TokenIssuer,
    session_manager: SessionManager<S>,
    hasher: CredentialHasher,
    user_repo: Arc<U>,
    /// Verified against when the email is unknown; built on first use
    dummy_hash: OnceLock<String>,
}

const DUMMY_PASSWORD: &str = "planner-dummy-password";

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    /// Create a new auth service
    pub fn new(config: AuthConfig, user_repo: Arc<U>, session_repo: Arc<S>) -> Self {
        let config = Arc::new(config);

        Self {
            token_issuer: TokenIssuer::new(Arc::clone(&config)),
            session_manager: SessionManager::new(session_repo, Arc::clone(&config)),
            hasher: CredentialHasher::new(config.hash_params.clone()),
            user_repo,
            config,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Shared configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Underlying session manager
    pub fn session_manager(&self) -> &SessionManager<S> {
        &self.session_manager
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a new user. No session is created.
    ///
    /// # Errors
    /// `Conflict` if the email is already registered.
    pub async fn register(
        &self,
        user_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let span = tracing::info_span!("auth", flow = %AuthFlow::Registering);
        self.register_in(user_name, email, password, &span)
            .instrument(span.clone())
            .await
    }

    async fn register_in(
        &self,
        user_name: &str,
        email: &str,
        password: &str,
        span: &Span,
    ) -> Result<User, AuthError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            span.record("flow", field::display(AuthFlow::Rejected));
            tracing::warn!("Registration rejected: email already registered");
            return Err(AuthError::Conflict("email already registered".to_string()));
        }

        let password_hash = self.hasher.hash(password).await?;
        let row = self
            .user_repo
            .create(CreateUser {
                id: UserId::new().0,
                user_name: user_name.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::default().as_str().to_string(),
            })
            .await?;

        let user = to_user(row)?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Log in from a device.
    ///
    /// Reuses the device's active session when one matches the fingerprint
    /// (rotating its refresh token), otherwise opens a new one.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email and for a wrong password alike.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        ip_address: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let span = tracing::info_span!(
            "auth",
            flow = %AuthFlow::LoggingIn,
            user_id = field::Empty,
            session_id = field::Empty
        );
        self.login_in(email, password, user_agent, ip_address, &span)
            .instrument(span.clone())
            .await
    }

    async fn login_in(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
        ip_address: &str,
        span: &Span,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.verify_password(email, password).await {
            Ok(user) => user,
            Err(e) => {
                span.record("flow", field::display(AuthFlow::Rejected));
                tracing::warn!("Login rejected: {}", e);
                return Err(e);
            }
        };
        span.record("user_id", field::display(user.id));

        let fingerprint = Fingerprint::new(user_agent, ip_address);
        let sessions = self.session_manager.find_by_user(user.id).await?;
        let active: Vec<Session> = sessions.into_iter().filter(|s| s.is_active).collect();

        let (session_id, refresh_token) = match match_fingerprint(&active, &fingerprint) {
            Some(existing) => {
                let session_id = existing.id;
                let expiry = self.session_manager.next_expiry()?;
                let refresh_token = self
                    .session_manager
                    .rotate_token(session_id, expiry)
                    .await
                    .map_err(|e| {
                        tracing::error!(%session_id, "Login failed rotating session: {}", e);
                        e
                    })?;
                (session_id, refresh_token)
            }
            None => self
                .session_manager
                .create_session(user.id, &fingerprint)
                .await
                .map_err(|e| {
                    tracing::error!("Login failed creating session: {}", e);
                    e
                })?,
        };
        span.record("session_id", field::display(session_id));

        let session = self.session_manager.find_by_id(session_id).await?;
        let access_token = self.token_issuer.mint(&user.profile(), session_id)?;

        span.record("flow", field::display(AuthFlow::Authenticated));
        tracing::info!("Login succeeded");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
            session,
        })
    }

    /// Trade a refresh token for a new access token, rotating the refresh
    /// token in the process.
    ///
    /// # Errors
    /// `InvalidCredentials` unless the session exists, is active and
    /// unexpired, was opened from `fingerprint`, and `refresh_token` matches.
    pub async fn refresh(
        &self,
        session_id: SessionId,
        refresh_token: &RefreshToken,
        fingerprint: &Fingerprint,
    ) -> Result<RefreshOutcome, AuthError> {
        let session = match self.session_manager.find_by_id(session_id).await {
            Ok(session) => session,
            Err(AuthError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !session.is_valid() || &session.fingerprint != fingerprint {
            tracing::warn!(%session_id, "Refresh rejected: session not usable from this device");
            return Err(AuthError::InvalidCredentials);
        }
        if !self
            .session_manager
            .verify_refresh_token(&session, refresh_token)
            .await?
        {
            tracing::warn!(%session_id, "Refresh rejected: token mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.get_user(session.user_id).await.map_err(|e| match e {
            AuthError::NotFound => AuthError::InvalidCredentials,
            other => other,
        })?;

        let expiry = self.session_manager.next_expiry()?;
        let refresh_token = self.session_manager.rotate_token(session_id, expiry).await?;
        let session = self.session_manager.find_by_id(session_id).await?;
        let access_token = self.token_issuer.mint(&user.profile(), session_id)?;

        tracing::info!(user_id = %user.id, %session_id, "Access token refreshed");
        Ok(RefreshOutcome {
            access_token,
            refresh_token,
            session,
        })
    }

    // =========================================================================
    // Token Validation
    // =========================================================================

    /// Validate an access token on its signature and expiry alone
    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<(UserProfile, SessionBinding), AuthError> {
        let claims = self.token_issuer.validate(token)?;
        Ok(TokenIssuer::extract_identity(&claims))
    }

    /// Validate an access token and confirm its session is still active
    ///
    /// # Errors
    /// `SessionInactive` if the bound session was deactivated, purged, or
    /// belongs to someone else.
    pub async fn authenticate(
        &self,
        token: &str,
    ) -> Result<(UserProfile, SessionBinding), AuthError> {
        let (user, binding) = self.validate_access_token(token)?;

        let session = match self.session_manager.find_by_id(binding.session_id).await {
            Ok(session) => session,
            Err(AuthError::NotFound) => return Err(AuthError::SessionInactive),
            Err(e) => return Err(e),
        };

        if !session.is_active || session.user_id != binding.user_id {
            tracing::debug!(session_id = %binding.session_id, "Token bound to inactive session");
            return Err(AuthError::SessionInactive);
        }

        Ok((user, binding))
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Check an email/password pair and return the user
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email and for a wrong password alike.
    /// Both paths run one Argon2 verification.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Some(row) = self.user_repo.find_by_email(email).await? else {
            let dummy = self.dummy_password_hash().await?;
            self.hasher.verify(password, &dummy).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &row.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        to_user(row)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        let row = self
            .user_repo
            .find_by_id(user_id.0)
            .await?
            .ok_or(AuthError::NotFound)?;
        to_user(row)
    }

    /// Change the display name after re-checking the password
    pub async fn update_user_name(
        &self,
        email: &str,
        password: &str,
        new_user_name: &str,
    ) -> Result<(), AuthError> {
        let user = self.verify_password(email, password).await?;
        self.user_repo.update_user_name(user.id.0, new_user_name).await?;
        tracing::info!(user_id = %user.id, "User name updated");
        Ok(())
    }

    /// Change the password after re-checking the current one
    pub async fn update_password(
        &self,
        email: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.verify_password(email, password).await?;
        let password_hash = self.hasher.hash(new_password).await?;
        self.user_repo
            .update_password_hash(user.id.0, &password_hash)
            .await?;
        tracing::info!(user_id = %user.id, "Password updated");
        Ok(())
    }

    /// Change the role after re-checking the password
    ///
    /// # Errors
    /// `PolicyViolation` if `role` is not one of `User` or `Admin`.
    pub async fn assign_role(
        &self,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Role, AuthError> {
        let user = self.verify_password(email, password).await?;
        let role: Role = role
            .parse()
            .map_err(|e: planner_types::RoleParseError| AuthError::PolicyViolation(e.to_string()))?;

        self.user_repo.update_role(user.id.0, role.as_str()).await?;
        tracing::info!(user_id = %user.id, %role, "Role assigned");
        Ok(role)
    }

    /// Delete a user and, through the store, their sessions and events
    ///
    /// # Errors
    /// `NoRowsAffected` if there was no such user.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), AuthError> {
        self.user_repo.delete(user_id.0).await?;
        tracing::info!(%user_id, "User deleted");
        Ok(())
    }

    // =========================================================================
    // Session Administration
    // =========================================================================

    /// Deactivate one session
    pub async fn logout(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.session_manager.deactivate(session_id).await
    }

    /// Deactivate every session of the user except `keep`
    pub async fn logout_other_devices(
        &self,
        user_id: UserId,
        keep: SessionId,
    ) -> Result<u64, AuthError> {
        self.session_manager.deactivate_all_except(user_id, keep).await
    }

    /// Active sessions of a user
    pub async fn list_sessions(&self, user_id: UserId) -> Result<Vec<Session>, AuthError> {
        self.session_manager.find_active_by_user(user_id).await
    }

    /// Remove inactive sessions; safe to run repeatedly
    pub async fn purge_inactive_sessions(&self) -> Result<u64, AuthError> {
        self.session_manager.purge_inactive().await
    }

    async fn dummy_password_hash(&self) -> Result<String, AuthError> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.clone());
        }
        let hash = self.hasher.hash(DUMMY_PASSWORD).await?;
        Ok(self.dummy_hash.get_or_init(|| hash).clone())
    }
}

impl<U: UserRepository, S: SessionRepository> std::fmt::Debug for AuthService<U, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_issuer", &self.token_issuer)
            .field("session_manager", &self.session_manager)
            .finish_non_exhaustive()
    }
}

/// A stored role that no longer parses is corrupt data, not a caller error
fn to_user(row: UserRow) -> Result<User, AuthError> {
    User::try_from(row).map_err(|e| {
        tracing::error!("Stored user record is invalid: {}", e);
        AuthError::Internal("Stored user record is invalid".to_string())
    })
}
