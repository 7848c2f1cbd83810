//! Planner DB - Database abstractions
//!
//! SQLx-based persistence for users, sessions and events.
//!
//! # Example
//!
//! ```rust,ignore
//! use planner_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/daily_planner").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("oleg@gmail.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
