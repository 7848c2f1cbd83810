//! PostgreSQL repository implementations

mod event;
mod session;
mod user;

pub use event::PgEventRepository;
pub use session::PgSessionRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub sessions: PgSessionRepository,
    pub events: PgEventRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            events: PgEventRepository::new(pool),
        }
    }
}
