//! Planner Auth Core - Authentication business logic
//!
//! Password hashing, per-device sessions with rotating refresh tokens, and
//! HS256 access tokens bound to those sessions.

pub mod config;
pub mod crypto;
pub mod error;
pub mod hasher;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use crypto::{RefreshToken, SigningKey, SigningKeyError};
pub use error::AuthError;
pub use hasher::CredentialHasher;
pub use service::{AuthFlow, AuthService, LoginOutcome, RefreshOutcome};
pub use session::{match_fingerprint, SessionManager};
pub use token::{AccessClaims, TokenIssuer};
