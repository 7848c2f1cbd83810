//! Common test utilities for planner-auth-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{MockSessionRepository, MockUserRepository};

use argon2::Params;
use planner_auth_core::{AuthConfig, AuthService};
use std::sync::Arc;

pub const TEST_SECRET: &str = "planner-integration-test-secret-0123456789";

/// Argon2 cost low enough for debug-build tests
#[allow(dead_code)]
pub fn test_config() -> AuthConfig {
    AuthConfig::try_new(TEST_SECRET)
        .unwrap()
        .with_hash_params(Params::new(1024, 1, 1, None).unwrap())
}

/// Service wired to fresh in-memory repositories
#[allow(dead_code)]
pub fn test_service() -> (
    AuthService<MockUserRepository, MockSessionRepository>,
    Arc<MockUserRepository>,
    Arc<MockSessionRepository>,
) {
    test_service_with(test_config())
}

/// Like [`test_service`] but with a caller-tuned config
#[allow(dead_code)]
pub fn test_service_with(
    config: AuthConfig,
) -> (
    AuthService<MockUserRepository, MockSessionRepository>,
    Arc<MockUserRepository>,
    Arc<MockSessionRepository>,
) {
    let users = Arc::new(MockUserRepository::new());
    let sessions = Arc::new(MockSessionRepository::new());
    let service = AuthService::new(config, Arc::clone(&users), Arc::clone(&sessions));
    (service, users, sessions)
}
