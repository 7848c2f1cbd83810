//! Planner Types - Shared domain types
//!
//! This crate contains domain types used across planner crates:
//! - User identity and roles
//! - Sessions and device fingerprints
//! - Calendar events

pub mod error;
pub mod event;
pub mod session;
pub mod user;

pub use error::*;
pub use event::*;
pub use session::*;
pub use user::*;
