//! Repository traits
//!
//! Async repository interfaces for database operations. Lookups return
//! `Option` and leave the "not found" decision to the caller; writes that
//! target a specific row report [`DbError::NoRowsAffected`](crate::DbError)
//! when nothing matched.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    ///
    /// Fails with `Conflict` if the email is already taken.
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Update display name
    async fn update_user_name(&self, id: Uuid, user_name: &str) -> DbResult<()>;

    /// Replace the stored password hash
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()>;

    /// Update user role
    async fn update_role(&self, id: Uuid, role: &str) -> DbResult<()>;

    /// Delete a user
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Find a session by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SessionRow>>;

    /// Find all sessions for a user, active or not
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>>;

    /// Find the active sessions for a user
    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>>;

    /// Create a new session
    async fn create(&self, session: CreateSession) -> DbResult<SessionRow>;

    /// Replace the refresh token hash and push out the expiry
    async fn update_token(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Mark an active session inactive
    async fn deactivate(&self, id: Uuid) -> DbResult<()>;

    /// Mark every active session of a user inactive except `keep`
    async fn deactivate_all_except(&self, user_id: Uuid, keep: Uuid) -> DbResult<u64>;

    /// Hard-delete inactive sessions
    async fn delete_inactive(&self) -> DbResult<u64>;
}

/// Create session input
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
}

/// Event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find an event by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<EventRow>>;

    /// Find a user's events for one day
    async fn find_by_user_and_date(&self, user_id: Uuid, date: NaiveDate)
        -> DbResult<Vec<EventRow>>;

    /// Create a new event
    async fn create(&self, event: CreateEvent) -> DbResult<EventRow>;

    /// Update title and color
    async fn update(&self, id: Uuid, title: &str, color: &str) -> DbResult<()>;

    /// Mark an event completed
    async fn complete(&self, id: Uuid) -> DbResult<()>;

    /// Delete an event
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create event input
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub color: String,
}
