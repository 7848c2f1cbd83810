//! Planner event handlers
//!
//! Events are scoped to the authenticated user; another user's event id
//! behaves exactly like an unknown one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use planner_db::{CreateEvent, EventRepository, EventRow};
use planner_types::{Event, EventId, UserId, DEFAULT_EVENT_COLOR};

use super::auth::require;
use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: NaiveDate,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// Load an event owned by `owner`
async fn owned_event<R: EventRepository>(
    repo: &R,
    owner: UserId,
    id: Uuid,
) -> ApiResult<EventRow> {
    match repo.find_by_id(id).await? {
        Some(row) if row.user_id == owner.0 => Ok(row),
        _ => Err(ApiError::NotFound("Event")),
    }
}

/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    require("title", &req.title)?;

    let color = req
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string());

    let row = state
        .repos
        .events
        .create(CreateEvent {
            id: EventId::new().0,
            user_id: auth_user.user_id().0,
            title: req.title.trim().to_string(),
            event_date: req.date,
            color,
        })
        .await?;

    tracing::info!(user_id = %auth_user.user_id(), event_id = %row.id, "Event created");
    Ok((StatusCode::CREATED, Json(Event::from(row))))
}

/// GET /api/v1/events?date=YYYY-MM-DD
pub async fn list_events(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let rows = state
        .repos
        .events
        .find_by_user_and_date(auth_user.user_id().0, query.date)
        .await?;

    Ok(Json(rows.into_iter().map(Event::from).collect()))
}

/// PUT /api/v1/events/{id}
pub async fn update_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    require("title", &req.title)?;
    require("color", &req.color)?;

    let repo = &state.repos.events;
    owned_event(repo, auth_user.user_id(), id).await?;
    repo.update(id, req.title.trim(), req.color.trim()).await?;

    let row = owned_event(repo, auth_user.user_id(), id).await?;
    Ok(Json(Event::from(row)))
}

/// POST /api/v1/events/{id}/complete
pub async fn complete_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let repo = &state.repos.events;
    let row = owned_event(repo, auth_user.user_id(), id).await?;
    if !row.completed {
        repo.complete(id).await?;
    }

    let row = owned_event(repo, auth_user.user_id(), id).await?;
    Ok(Json(Event::from(row)))
}

/// DELETE /api/v1/events/{id}
pub async fn delete_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = &state.repos.events;
    owned_event(repo, auth_user.user_id(), id).await?;
    repo.delete(id).await?;

    tracing::info!(user_id = %auth_user.user_id(), event_id = %id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}
