//! PostgreSQL session repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ensure_affected, DbResult};
use crate::models::SessionRow;
use crate::repo::{CreateSession, SessionRepository};

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SessionRow>> {
        let session = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token_hash, expires_at, user_agent,
                   ip_address, is_active, created_at
            FROM user_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token_hash, expires_at, user_agent,
                   ip_address, is_active, created_at
            FROM user_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token_hash, expires_at, user_agent,
                   ip_address, is_active, created_at
            FROM user_sessions
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn create(&self, session: CreateSession) -> DbResult<SessionRow> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO user_sessions
                (id, user_id, refresh_token_hash, expires_at, user_agent, ip_address, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, user_id, refresh_token_hash, expires_at, user_agent,
                      ip_address, is_active, created_at
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_token(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE user_sessions SET refresh_token_hash = $1, expires_at = $2 WHERE id = $3",
        )
        .bind(refresh_token_hash)
        .bind(expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected())?;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> DbResult<()> {
        // Postgres counts matched rows, so the `is_active` filter is what makes
        // a repeated call report zero rows.
        let result =
            sqlx::query("UPDATE user_sessions SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await?;

        ensure_affected(result.rows_affected())?;
        Ok(())
    }

    async fn deactivate_all_except(&self, user_id: Uuid, keep: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_sessions SET is_active = FALSE
            WHERE user_id = $1 AND id <> $2 AND is_active
            "#,
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected())
    }

    async fn delete_inactive(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE NOT is_active")
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())
    }
}
