//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use planner_types::{
    Event, EventId, Fingerprint, Role, RoleParseError, Session, SessionId, User, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Session row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Event row from the database
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub completed: bool,
    pub color: String,
}

impl UserRow {
    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

// Role is validated here rather than by a database constraint.
impl TryFrom<UserRow> for User {
    type Error = RoleParseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId(row.id),
            role: row.role.parse::<Role>()?,
            user_name: row.user_name,
            email: row.email,
            password_hash: row.password_hash,
        })
    }
}

impl SessionRow {
    /// Convert to domain SessionId
    pub fn session_id(&self) -> SessionId {
        SessionId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId(row.id),
            user_id: UserId(row.user_id),
            refresh_token_hash: row.refresh_token_hash,
            expires_at: row.expires_at,
            fingerprint: Fingerprint::new(row.user_agent, row.ip_address),
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId(row.id),
            user_id: UserId(row.user_id),
            title: row.title,
            date: row.event_date,
            completed: row.completed,
            color: row.color,
        }
    }
}
