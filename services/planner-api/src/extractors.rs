//! Axum extractors for authentication and device fingerprinting

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::net::SocketAddr;

use planner_auth_core::AuthError;
use planner_types::{Fingerprint, SessionId, UserId, UserProfile};

use crate::state::AppState;

/// Authenticated user extracted from request
///
/// The bearer token has been verified and its session confirmed active.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile: UserProfile,
    pub session_id: SessionId,
}

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        self.profile.id
    }
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
#[derive(Debug)]
pub struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl AuthRejection {
    fn missing_token() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "MISSING_TOKEN",
            message: "No authentication token provided",
        }
    }

    fn invalid_header() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid Authorization header encoding",
        }
    }
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => Self {
                status: StatusCode::UNAUTHORIZED,
                code: "TOKEN_EXPIRED",
                message: "Access token expired",
            },
            AuthError::SessionInactive => Self {
                status: StatusCode::UNAUTHORIZED,
                code: "SESSION_INACTIVE",
                message: "Session has been logged out",
            },
            e if e.is_server_error() => {
                tracing::error!(error = ?e, "Authentication failed on the server side");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "INTERNAL_ERROR",
                    message: "Internal server error",
                }
            }
            _ => Self {
                status: StatusCode::UNAUTHORIZED,
                code: "INVALID_TOKEN",
                message: "Invalid or expired token",
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_bearer(parts)?;

        let (profile, binding) = app_state.auth.authenticate(token).await.map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            AuthRejection::from(e)
        })?;

        Ok(AuthUser {
            profile,
            session_id: binding.session_id,
        })
    }
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer(parts: &Parts) -> Result<&str, AuthRejection> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(AuthRejection::missing_token)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthRejection::invalid_header())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthRejection::missing_token()),
    }
}

/// Device fingerprint of the caller: `User-Agent` plus peer IP
#[derive(Debug, Clone)]
pub struct ClientFingerprint(pub Fingerprint);

impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        fingerprint_from_parts(parts).map(ClientFingerprint)
    }
}

fn fingerprint_from_parts(parts: &Parts) -> Result<Fingerprint, StatusCode> {
    let ConnectInfo(addr) = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .ok_or_else(|| {
            tracing::error!("Peer address unavailable; serve with connect info");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    Ok(Fingerprint::new(user_agent, addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name.clone(), *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer() {
        let parts = parts(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_bearer(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_rejections() {
        let missing = extract_bearer(&parts(&[])).unwrap_err();
        assert_eq!(missing.code, "MISSING_TOKEN");

        let basic = extract_bearer(&parts(&[(header::AUTHORIZATION, "Basic dXNlcjpwdw==")]))
            .unwrap_err();
        assert_eq!(basic.status, StatusCode::UNAUTHORIZED);

        let empty = extract_bearer(&parts(&[(header::AUTHORIZATION, "Bearer   ")])).unwrap_err();
        assert_eq!(empty.code, "MISSING_TOKEN");
    }

    #[test]
    fn test_rejection_from_auth_error() {
        assert_eq!(AuthRejection::from(AuthError::Expired).code, "TOKEN_EXPIRED");
        assert_eq!(
            AuthRejection::from(AuthError::SessionInactive).code,
            "SESSION_INACTIVE"
        );
        assert_eq!(
            AuthRejection::from(AuthError::InvalidSignature).code,
            "INVALID_TOKEN"
        );
        assert_eq!(
            AuthRejection::from(AuthError::Internal("boom".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_fingerprint_from_parts() {
        let mut parts = parts(&[(header::USER_AGENT, "Mozilla/5.0")]);
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 7], 51000))));

        let fingerprint = fingerprint_from_parts(&parts).unwrap();
        assert_eq!(fingerprint, Fingerprint::new("Mozilla/5.0", "203.0.113.7"));
    }

    #[test]
    fn test_fingerprint_without_user_agent() {
        let mut parts = parts(&[]);
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let fingerprint = fingerprint_from_parts(&parts).unwrap();
        assert_eq!(fingerprint.user_agent, "");
        assert_eq!(fingerprint.ip_address, "127.0.0.1");
    }

    #[test]
    fn test_fingerprint_requires_connect_info() {
        assert_eq!(
            fingerprint_from_parts(&parts(&[])).unwrap_err(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
