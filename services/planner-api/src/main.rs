//! Planner API
//!
//! Account, session and planner-event endpoints for the daily planner.

mod config;
mod error;
mod extractors;
mod handlers;
mod state;

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use planner_auth_core::AuthService;
use planner_db::pg::Repositories;
use planner_db::{create_pool_with_options, run_migrations};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting planner API");

    let config = Config::from_env()?;

    // Database
    let pool = create_pool_with_options(&config.database_url, &config.pool).await?;
    run_migrations(&pool).await?;

    let repos = Repositories::new(pool.clone());
    let auth = AuthService::new(
        config.auth.clone(),
        Arc::new(repos.users.clone()),
        Arc::new(repos.sessions.clone()),
    );
    let state = AppState::new(auth, repos, pool);

    if let Some(interval) = config.session_purge_interval {
        tokio::spawn(purge_sessions_periodically(state.clone(), interval));
    }

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Planner API stopped");
    Ok(())
}

fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/me", get(handlers::me))
        .route("/logout", post(handlers::logout))
        .route("/logout-others", post(handlers::logout_others))
        .route("/sessions", get(handlers::sessions));

    let users = Router::new()
        .route("/me", delete(handlers::delete_me))
        .route("/me/name", put(handlers::update_name))
        .route("/me/password", put(handlers::update_password))
        .route("/me/role", put(handlers::assign_role));

    let events = Router::new()
        .route("/", post(handlers::create_event).get(handlers::list_events))
        .route(
            "/{id}",
            put(handlers::update_event).delete(handlers::delete_event),
        )
        .route("/{id}/complete", post(handlers::complete_event));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .nest("/api/v1/auth", auth)
        .nest("/api/v1/users", users)
        .nest("/api/v1/events", events)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Hard-delete inactive sessions on a fixed interval
async fn purge_sessions_periodically(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; skip it so startup stays quiet
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = state.auth.purge_inactive_sessions().await {
            tracing::error!(error = %e, "Session purge failed");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
