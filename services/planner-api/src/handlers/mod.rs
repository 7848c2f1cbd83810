//! HTTP handlers

mod auth;
mod events;
mod health;
mod users;

pub use auth::{login, logout, logout_others, me, refresh, register, sessions};
pub use events::{complete_event, create_event, delete_event, list_events, update_event};
pub use health::{health, ready};
pub use users::{assign_role, delete_me, update_name, update_password};
