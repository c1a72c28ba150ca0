use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::{ErrorResponse, Role};

/// Where the dispatcher sends a user whose session is missing or expired.
pub const LOGIN_REDIRECT: &str = "/auth/login";
/// Where the dispatcher sends a user whose role is too low for a screen.
pub const ACCESS_DENIED_REDIRECT: &str = "/access-denied";

/// AuthError
///
/// Every failure the session core can report. Callers match on the variant before
/// rendering anything: login-form errors are shown to the user, guard denials become
/// silent redirects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Credentials missing or not matching a known identity.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The identity exists but may not sign in with the requested role.
    #[error("This account cannot sign in as {requested} (account role: {confirmed})")]
    RoleMismatch { requested: Role, confirmed: Role },

    /// No valid session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A valid session whose role is below the route class minimum.
    #[error("Insufficient role for this screen")]
    InsufficientRole,

    /// A route class name outside the static classification.
    #[error("Unknown route class: {0}")]
    UnknownRouteClass(String),

    /// A screen name missing from the screen table.
    #[error("Unknown screen: {0}")]
    UnknownScreen(String),

    /// The identity provider could not be reached or answered garbage.
    #[error("Identity provider unavailable: {0}")]
    IdentityUnavailable(String),
}

impl AuthError {
    /// Stable machine-readable code used in JSON bodies and the TypeScript client.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::RoleMismatch { .. } => "role_mismatch",
            Self::Unauthenticated => "unauthenticated",
            Self::InsufficientRole => "insufficient_role",
            Self::UnknownRouteClass(_) => "unknown_route_class",
            Self::UnknownScreen(_) => "unknown_screen",
            Self::IdentityUnavailable(_) => "identity_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RoleMismatch { .. } | Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::UnknownRouteClass(_) => StatusCode::BAD_REQUEST,
            Self::UnknownScreen(_) => StatusCode::NOT_FOUND,
            Self::IdentityUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some(LOGIN_REDIRECT),
            Self::InsufficientRole => Some(ACCESS_DENIED_REDIRECT),
            _ => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::IdentityUnavailable(detail) => {
                tracing::error!(error = %detail, "Identity provider failure");
                "Sign-in is temporarily unavailable".to_string()
            }
            Self::UnknownRouteClass(class) => {
                tracing::error!(route_class = %class, "Dispatcher asked for an unknown route class");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
            redirect: self.redirect().map(str::to_string),
        };

        (self.status(), Json(body)).into_response()
    }
}
