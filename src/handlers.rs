use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::ActiveSession,
    error::AuthError,
    models::{
        AuthorizeRequest, AuthorizeResponse, ErrorResponse, LoginRequest, Role, RoleInfo,
        RouteClass, ScreenAccess, Session, SessionStatus,
    },
};

// --- Handlers ---

/// health
///
/// [Public Route] Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// list_roles
///
/// [Public Route] The role cards shown on the login screen, in privilege order.
#[utoipa::path(
    get,
    path = "/roles",
    responses((status = 200, description = "Role catalogue", body = [RoleInfo]))
)]
pub async fn list_roles() -> Json<Vec<RoleInfo>> {
    Json(Role::ALL.iter().map(|role| role.info()).collect())
}

/// login
///
/// [Public Route] Issues a new session, replacing any existing one. Guests need no
/// credentials. A failed login leaves the current session untouched.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = Session),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Role not permitted for this identity", body = ErrorResponse),
        (status = 502, description = "Identity provider unavailable", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Session>, AuthError> {
    let session = state
        .core
        .login(payload.role, payload.credentials.as_ref())
        .await?;
    Ok(Json(session))
}

/// logout
///
/// [Session Route] Revokes the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn logout(_session: ActiveSession, State(state): State<AppState>) -> StatusCode {
    state.core.logout();
    StatusCode::NO_CONTENT
}

/// session_status
///
/// [Public Route] Whether a session exists, its role and lifecycle phase. Never fails;
/// the dispatcher polls this to decide its initial redirect.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Current session status", body = SessionStatus))
)]
pub async fn session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.core.status())
}

/// get_me
///
/// [Session Route] The full record of the active session.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Active session", body = Session),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn get_me(ActiveSession(session): ActiveSession) -> Json<Session> {
    Json(session)
}

/// authorize
///
/// [Public Route] Asks the guard about a route class. A denial is a normal answer
/// (200 with `allowed = false`); only an unrecognised class is an error.
#[utoipa::path(
    post,
    path = "/authorize",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Decision", body = AuthorizeResponse),
        (status = 400, description = "Unknown route class", body = ErrorResponse)
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, AuthError> {
    let route_class: RouteClass = payload.route_class.parse()?;
    let decision = state.core.authorize(route_class);
    Ok(Json(AuthorizeResponse::new(route_class, decision)))
}

/// list_screens
///
/// [Public Route] The screens the current session may open. Used to build the tab bar
/// and the executive quick actions.
#[utoipa::path(
    get,
    path = "/screens",
    responses((status = 200, description = "Accessible screens", body = [ScreenAccess]))
)]
pub async fn list_screens(State(state): State<AppState>) -> Json<Vec<ScreenAccess>> {
    Json(state.core.guard().accessible_screens())
}

/// open_screen
///
/// [Public Route] Gate check the dispatcher runs before entering a screen. A denial is
/// returned as an error carrying the redirect target.
///
/// The router captures the rest of the path (`/screens/{*screen}`). OpenAPI has no
/// catch-all parameter, so the document names it `{screen}`; the slash inside a screen
/// name may be sent as-is or percent-encoded (`executive%2Fvoting`), both resolve.
#[utoipa::path(
    get,
    path = "/screens/{screen}",
    params((
        "screen" = String,
        Path,
        description = "Screen name; may contain `/` (raw or as `%2F`), e.g. executive/voting",
        example = "executive/voting"
    )),
    responses(
        (status = 200, description = "Screen may be opened", body = ScreenAccess),
        (status = 401, description = "No session; redirect to login", body = ErrorResponse),
        (status = 403, description = "Role too low; redirect to access denied", body = ErrorResponse),
        (status = 404, description = "Unknown screen", body = ErrorResponse)
    )
)]
pub async fn open_screen(
    State(state): State<AppState>,
    Path(screen): Path<String>,
) -> Result<Json<ScreenAccess>, AuthError> {
    let (route_class, decision) = state.core.guard().authorize_screen(&screen)?;
    decision.into_result()?;
    Ok(Json(ScreenAccess {
        screen,
        route_class,
    }))
}
