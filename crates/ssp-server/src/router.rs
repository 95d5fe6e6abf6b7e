//! Router configuration.
//!
//! Mounts the auth actions under `/Security` (unless the bridge is disabled)
//! next to the health check and a placeholder host page.

use axum::{
    http::{header, HeaderValue},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::controller::SECURITY_PATH;
use crate::handlers;
use crate::state::AppState;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let mut host = Router::new().route("/", get(root));
    if state.config.passive_login {
        host = with_passive_login(host, state.clone());
    }

    let health = Router::new().route("/health", get(health_check));

    let mut app = Router::new().merge(host).merge(health);
    if state.bridge().enable_auth {
        app = app.nest(SECURITY_PATH, security_router(state));
    } else {
        tracing::info!("Bridge authentication disabled, auth actions not mounted");
    }

    app.layer(TraceLayer::new_for_http())
}

/// Creates the auth action routes.
///
/// Every response forbids framing by other origins.
pub fn security_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/loggedout", get(handlers::logged_out))
        .route("/LoginForm", get(handlers::login_form))
        .route("/ping", get(handlers::ping))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .with_state(state)
}

/// Wraps host routes so anonymous visitors get one silent login attempt.
pub fn with_passive_login(routes: Router, state: AppState) -> Router {
    routes.layer(middleware::from_fn_with_state(
        state,
        handlers::passive_login,
    ))
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "SSP bridge",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
