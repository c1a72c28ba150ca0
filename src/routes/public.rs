use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable with or without a session. The login screen, the dispatcher's
/// status polling and every guard query live here: a denial is reported in the response,
/// not by refusing the route.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(handlers::health))
        // GET /roles
        // Role cards for the login screen.
        .route("/roles", get(handlers::list_roles))
        // POST /auth/login
        // Issues a session; supersedes any existing one.
        .route("/auth/login", post(handlers::login))
        // GET /auth/session
        .route("/auth/session", get(handlers::session_status))
        // POST /authorize
        // Raw route-class decision.
        .route("/authorize", post(handlers::authorize))
        // GET /screens
        .route("/screens", get(handlers::list_screens))
        // GET /screens/{*screen}
        // Screen names contain slashes (executive/voting), hence the wildcard.
        .route("/screens/{*screen}", get(handlers::open_screen))
}
