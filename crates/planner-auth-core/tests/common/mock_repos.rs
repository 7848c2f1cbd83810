//! Mock repositories for testing
//!
//! Mirror the Postgres semantics the services rely on: unique emails, and
//! `NoRowsAffected` whenever a targeted write matches nothing.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use planner_db::{
    CreateSession, CreateUser, DbError, DbResult, SessionRepository, SessionRow, UserRepository,
    UserRow,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn pool_timeout() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    #[allow(dead_code)]
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    fn update<F: FnOnce(&mut UserRow)>(&self, id: Uuid, f: F) -> DbResult<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NoRowsAffected)?;
        f(&mut *user);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        // Reserve the email atomically, like the unique index does
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(DbError::Conflict("user already exists".to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        let row = UserRow {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        self.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_user_name(&self, id: Uuid, user_name: &str) -> DbResult<()> {
        self.update(id, |u| u.user_name = user_name.to_string())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        self.update(id, |u| u.password_hash = password_hash.to_string())
    }

    async fn update_role(&self, id: Uuid, role: &str) -> DbResult<()> {
        self.update(id, |u| u.role = role.to_string())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let (_, user) = self.users.remove(&id).ok_or(DbError::NoRowsAffected)?;
        self.by_email.remove(&user.email);
        Ok(())
    }
}

/// In-memory session repository for testing
#[derive(Default, Clone)]
pub struct MockSessionRepository {
    sessions: Arc<DashMap<Uuid, SessionRow>>,
    fail_writes: Arc<AtomicBool>,
    drop_on_update: Arc<AtomicBool>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session directly for testing
    #[allow(dead_code)]
    pub fn insert_session(&self, session: SessionRow) {
        self.sessions.insert(session.id, session);
    }

    /// Delete the target row at the start of the next `update_token`, as a
    /// concurrent purge would between the read and the write
    #[allow(dead_code)]
    pub fn drop_row_on_next_update(&self) {
        self.drop_on_update.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent write fail as if the pool were exhausted
    #[allow(dead_code)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Raw row, bypassing the trait
    #[allow(dead_code)]
    pub fn get(&self, id: Uuid) -> Option<SessionRow> {
        self.sessions.get(&id).map(|r| r.value().clone())
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(pool_timeout())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SessionRow>> {
        Ok(self.sessions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().user_id == user_id && r.value().is_active)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn create(&self, session: CreateSession) -> DbResult<SessionRow> {
        self.check_writable()?;
        let row = SessionRow {
            id: session.id,
            user_id: session.user_id,
            refresh_token_hash: session.refresh_token_hash,
            expires_at: session.expires_at,
            user_agent: session.user_agent,
            ip_address: session.ip_address,
            is_active: true,
            created_at: Utc::now(),
        };
        self.sessions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_token(
        &self,
        id: Uuid,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        self.check_writable()?;
        if self.drop_on_update.swap(false, Ordering::SeqCst) {
            self.sessions.remove(&id);
        }
        let mut s = self.sessions.get_mut(&id).ok_or(DbError::NoRowsAffected)?;
        s.refresh_token_hash = refresh_token_hash.to_string();
        s.expires_at = expires_at;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> DbResult<()> {
        self.check_writable()?;
        match self.sessions.get_mut(&id) {
            Some(mut s) if s.is_active => {
                s.is_active = false;
                Ok(())
            }
            _ => Err(DbError::NoRowsAffected),
        }
    }

    async fn deactivate_all_except(&self, user_id: Uuid, keep: Uuid) -> DbResult<u64> {
        self.check_writable()?;
        let mut count = 0;
        for mut s in self.sessions.iter_mut() {
            if s.user_id == user_id && s.id != keep && s.is_active {
                s.is_active = false;
                count += 1;
            }
        }
        if count == 0 {
            return Err(DbError::NoRowsAffected);
        }
        Ok(count)
    }

    async fn delete_inactive(&self) -> DbResult<u64> {
        self.check_writable()?;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.is_active);
        let count = (before - self.sessions.len()) as u64;
        if count == 0 {
            return Err(DbError::NoRowsAffected);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user(email: &str) -> CreateUser {
        CreateUser {
            id: Uuid::new_v4(),
            user_name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: "User".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_user_repo_crud() {
        let repo = MockUserRepository::new();

        let user = repo.create(create_user("test@example.com")).await.unwrap();
        assert!(repo.find_by_id(user.id).await.unwrap().is_some());
        assert!(repo.find_by_email("test@example.com").await.unwrap().is_some());

        repo.update_role(user.id, "Admin").await.unwrap();
        assert_eq!(repo.find_by_id(user.id).await.unwrap().unwrap().role, "Admin");

        repo.delete(user.id).await.unwrap();
        assert!(repo.find_by_email("test@example.com").await.unwrap().is_none());
        assert!(matches!(repo.delete(user.id).await, Err(DbError::NoRowsAffected)));
    }

    #[tokio::test]
    async fn test_mock_user_repo_rejects_duplicate_email() {
        let repo = MockUserRepository::new();
        repo.create(create_user("dup@example.com")).await.unwrap();
        assert!(matches!(
            repo.create(create_user("dup@example.com")).await,
            Err(DbError::Conflict(_))
        ));
    }
}
