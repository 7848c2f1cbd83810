//! Account handlers
//!
//! Every change re-checks the current password, even with a valid token.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use planner_types::Role;

use super::auth::require;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    pub password: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

/// PUT /api/v1/users/me/name
pub async fn update_name(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdateNameRequest>,
) -> ApiResult<StatusCode> {
    require("user_name", &req.user_name)?;

    state
        .auth
        .update_user_name(&auth_user.profile.email, &req.password, req.user_name.trim())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/users/me/password
pub async fn update_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    require("new_password", &req.new_password)?;

    state
        .auth
        .update_password(&auth_user.profile.email, &req.password, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/users/me/role
///
/// The new role shows up in access tokens minted after the change.
pub async fn assign_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .auth
        .assign_role(&auth_user.profile.email, &req.password, &req.role)
        .await?;

    Ok(Json(RoleResponse { role }))
}

/// DELETE /api/v1/users/me
///
/// Sessions and events go with the user
pub async fn delete_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<StatusCode> {
    state.auth.delete_user(auth_user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
