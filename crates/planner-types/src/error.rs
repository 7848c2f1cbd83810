//! Common error types

use thiserror::Error;

/// Error parsing a role string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized role: {0}")]
pub struct RoleParseError(pub String);
