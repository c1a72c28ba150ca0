use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Session Router Module
///
/// Endpoints that only make sense while a session exists. The router is wrapped in the
/// `require_session` layer in `create_router`, so every handler here can rely on a valid
/// session being present when it runs.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // POST /auth/logout
        // Revokes the session and erases any persisted copy.
        .route("/auth/logout", post(handlers::logout))
}
