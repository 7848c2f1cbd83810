//! Authentication handlers (register, login, refresh, me, logout, sessions)

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use planner_auth_core::{AuthError, RefreshToken};
use planner_types::{Session, SessionId, User, UserProfile};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, ClientFingerprint};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub refresh_token: String,
    pub session: SessionInfo,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub session_id: Uuid,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub user_agent: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub current: bool,
}

impl SessionInfo {
    fn new(session: Session, current: Option<SessionId>) -> Self {
        Self {
            current: current == Some(session.id),
            id: session.id,
            user_agent: session.fingerprint.user_agent,
            ip_address: session.fingerprint.ip_address,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub session_id: SessionId,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutOthersResponse {
    pub deactivated: u64,
}

pub(crate) fn require(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn token_response(
    state: &AppState,
    access_token: String,
    refresh_token: RefreshToken,
    session: Session,
) -> TokenResponse {
    TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.auth.config().access_token_duration.as_secs(),
        refresh_token: refresh_token.into_inner(),
        session: SessionInfo::new(session, None),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    require("user_name", &req.user_name)?;
    require("email", &req.email)?;
    require("password", &req.password)?;

    let user: User = state
        .auth
        .register(req.user_name.trim(), req.email.trim(), &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// POST /api/v1/auth/login
///
/// Reuses the caller's device session when there is one
pub async fn login(
    State(state): State<AppState>,
    ClientFingerprint(fingerprint): ClientFingerprint,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    require("email", &req.email)?;
    require("password", &req.password)?;

    let outcome = state
        .auth
        .login(
            req.email.trim(),
            &req.password,
            &fingerprint.user_agent,
            &fingerprint.ip_address,
        )
        .await?;

    let user = outcome.user.profile();
    Ok(Json(LoginResponse {
        tokens: token_response(
            &state,
            outcome.access_token,
            outcome.refresh_token,
            outcome.session,
        ),
        user,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Trade a refresh token for a new access token; the refresh token rotates
pub async fn refresh(
    State(state): State<AppState>,
    ClientFingerprint(fingerprint): ClientFingerprint,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    require("refresh_token", &req.refresh_token)?;

    let outcome = state
        .auth
        .refresh(
            SessionId(req.session_id),
            &RefreshToken::from_client(req.refresh_token),
            &fingerprint,
        )
        .await?;

    Ok(Json(token_response(
        &state,
        outcome.access_token,
        outcome.refresh_token,
        outcome.session,
    )))
}

/// GET /api/v1/auth/me
///
/// Current user as stored, not as the token remembers it
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = state.auth.get_user(auth_user.user_id()).await?;

    Ok(Json(MeResponse {
        user: user.profile(),
        session_id: auth_user.session_id,
    }))
}

/// POST /api/v1/auth/logout
///
/// Deactivate the current session
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<LogoutResponse>> {
    state.auth.logout(auth_user.session_id).await?;
    Ok(Json(LogoutResponse { success: true }))
}

/// POST /api/v1/auth/logout-others
///
/// Deactivate every session except the current one
pub async fn logout_others(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<LogoutOthersResponse>> {
    let deactivated = match state
        .auth
        .logout_other_devices(auth_user.user_id(), auth_user.session_id)
        .await
    {
        Ok(count) => count,
        // Nothing else was signed in
        Err(AuthError::NoRowsAffected) => 0,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(LogoutOthersResponse { deactivated }))
}

/// GET /api/v1/auth/sessions
///
/// Active sessions of the current user
pub async fn sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<Vec<SessionInfo>>> {
    let mut sessions = state.auth.list_sessions(auth_user.user_id()).await?;
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionInfo::new(s, Some(auth_user.session_id)))
            .collect(),
    ))
}
