//! Application state

use std::ops::Deref;
use std::sync::Arc;

use planner_auth_core::AuthService;
use planner_db::pg::{PgSessionRepository, PgUserRepository, Repositories};
use planner_db::DbPool;

/// Type alias for the auth service with concrete repository types
pub type AuthServiceImpl = AuthService<PgUserRepository, PgSessionRepository>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for credentials, sessions and tokens
    pub auth: Arc<AuthServiceImpl>,
    /// Database repositories
    pub repos: Repositories,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, repos: Repositories, pool: DbPool) -> Self {
        Self {
            auth: Arc::new(auth),
            repos,
            pool: SharedPool(Arc::new(pool)),
        }
    }
}
