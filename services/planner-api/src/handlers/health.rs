//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

const SERVICE_NAME: &str = "planner-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: DatabaseCheck,
}

#[derive(Debug, Serialize)]
pub struct DatabaseCheck {
    pub reachable: bool,
    pub latency_ms: u64,
}

impl ReadyResponse {
    fn from_check(database: DatabaseCheck) -> (StatusCode, Self) {
        if database.reachable {
            (StatusCode::OK, Self { status: "ready", database })
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Self { status: "unavailable", database },
            )
        }
    }
}

/// GET /health - Liveness probe, touches nothing
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - Readiness probe; 503 while the database is unreachable
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = Instant::now();
    let result = sqlx::query("SELECT 1").execute(&*state.pool).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    if let Err(e) = &result {
        tracing::warn!(error = %e, "Readiness check failed");
    }

    let (status, body) = ReadyResponse::from_check(DatabaseCheck {
        reachable: result.is_ok(),
        latency_ms,
    });
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_needs_no_dependencies() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "planner-api");
    }

    #[test]
    fn test_ready_status_follows_database() {
        let (status, body) = ReadyResponse::from_check(DatabaseCheck {
            reachable: true,
            latency_ms: 2,
        });
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");

        let (status, body) = ReadyResponse::from_check(DatabaseCheck {
            reachable: false,
            latency_ms: 5000,
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unavailable");
    }
}
