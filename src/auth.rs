use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{error::AuthError, models::Session, session::CoreState};

/// ActiveSession Extractor Result
///
/// The valid session held by the core at the moment the request was handled. Handlers
/// that take this argument are only reached while someone is logged in.
#[derive(Debug, Clone)]
pub struct ActiveSession(pub Session);

/// ActiveSession Extractor Implementation
///
/// Reads the store through the session core. An expired record is cleared by the store's
/// lazy expiry during this read, so the request is rejected on the first access after
/// `expires_at`.
///
/// Rejection: `AuthError::Unauthenticated` (401 with a redirect to the login screen).
impl<S> FromRequestParts<S> for ActiveSession
where
    S: Send + Sync,
    CoreState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let core = CoreState::from_ref(state);
        core.current_session()
            .map(ActiveSession)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// require_session
///
/// Route layer for the session-only router. The extractor rejects before the handler runs.
pub async fn require_session(_session: ActiveSession, request: Request, next: Next) -> Response {
    next.run(request).await
}
