//! PostgreSQL event repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ensure_affected, DbResult};
use crate::models::EventRow;
use crate::repo::{CreateEvent, EventRepository};

/// PostgreSQL event repository
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<EventRow>> {
        let event = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, user_id, title, event_date, completed, color
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DbResult<Vec<EventRow>> {
        let events = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, user_id, title, event_date, completed, color
            FROM events
            WHERE user_id = $1 AND event_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn create(&self, event: CreateEvent) -> DbResult<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (id, user_id, title, event_date, completed, color)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id, user_id, title, event_date, completed, color
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.title)
        .bind(event.event_date)
        .bind(&event.color)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, title: &str, color: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE events SET title = $1, color = $2 WHERE id = $3")
            .bind(title)
            .bind(color)
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())?;
        Ok(())
    }

    async fn complete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE events SET completed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected())?;
        Ok(())
    }
}
