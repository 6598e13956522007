//! Hearth Auth API
//!
//! Authentication and federated-identity service for the Hearth household
//! budgeting backend.
//!
//! ## REST Endpoints
//!
//! - `POST /signup` - Create a household and its founding user
//! - `POST /login` / `POST /logout` - Password session management
//! - `GET /csrf` - Issue a CSRF token for state-changing requests
//! - `GET /auth/line/login` - Start the LINE authorization-code flow
//! - `GET /auth/line/callback` - Provider callback (login or pre-auth hand-off)
//! - `POST /auth/line/link` - Link a pending LINE identity to an account
//! - `POST /auth/line/create` - Create an account for a pending LINE identity
//! - `GET /user` - Logged-in user info
//! - `GET /household/users` / `POST /household/join` - Household membership
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe

mod config;
mod cookies;
mod error;
mod extractors;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use hearth_db::pg::Repositories;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("auth_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Hearth Auth API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(http_port = config.http_port, "Configuration loaded");

    // Create database pool
    let pool = hearth_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Create repositories and wire up services
    let repos = Repositories::new(pool.clone());
    let state = AppState::new(config, repos, pool);

    // Periodically drop expired CSRF tokens and OAuth state nonces
    spawn_token_sweeper(&state);

    // Build HTTP router
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let app = build_router(state);

    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout();

    // Routes subject to CSRF enforcement on state-changing methods
    let api = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/csrf", get(handlers::csrf_token))
        .route("/auth/line/login", get(handlers::line_login))
        .route("/auth/line/callback", get(handlers::line_callback))
        .route("/auth/line/link", post(handlers::line_link_account))
        .route("/auth/line/create", post(handlers::line_create_account))
        .route("/user", get(handlers::me).delete(handlers::delete_user))
        .route("/household/users", get(handlers::household_users))
        .route("/household/join", post(handlers::join_household))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_csrf_token,
        ));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Build middleware stack (order matters - outermost first)
    let stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(api)
        .layer(stack)
        .merge(health_routes)
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origin
fn cors_layer(config: &Arc<Config>) -> CorsLayer {
    let origin = config
        .frontend_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(middleware::CSRF_HEADER),
        ])
        .allow_credentials(true)
}

/// Spawn the periodic sweep over both expiring token stores
fn spawn_token_sweeper(state: &AppState) {
    let csrf = Arc::clone(&state.csrf);
    let state_store = Arc::clone(&state.state_store);
    let interval = state.config.sweep_interval;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = csrf.sweep() + state_store.sweep();
            if swept > 0 {
                tracing::debug!(swept, "Swept expired tokens");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
