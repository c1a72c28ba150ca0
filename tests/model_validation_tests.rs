use axum::{http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use sfss_session::{
    AuthError, Credentials, Decision, DenyReason, Role, RouteClass, Session,
    error::{ACCESS_DENIED_REDIRECT, LOGIN_REDIRECT},
    models::{AuthorizeResponse, ErrorResponse, LoginRequest, SessionStatus},
};

// --- Role ---

#[test]
fn test_role_privilege_order() {
    assert!(Role::Guest < Role::Student);
    assert!(Role::Student < Role::Executive);
    assert_eq!(Role::ALL.iter().max(), Some(&Role::Executive));
}

#[test]
fn test_role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Executive).unwrap(), json!("executive"));
    let parsed: Role = serde_json::from_value(json!("student")).unwrap();
    assert_eq!(parsed, Role::Student);
    assert!(serde_json::from_value::<Role>(json!("Admin")).is_err());
}

#[test]
fn test_role_from_str_is_lenient_on_case() {
    assert_eq!(" Executive ".parse::<Role>(), Ok(Role::Executive));
    assert!("treasurer".parse::<Role>().is_err());
}

#[test]
fn test_role_cards() {
    let guest = Role::Guest.info();
    assert_eq!(guest.title, "Guest");
    assert!(!guest.requires_credentials);
    assert!(guest.features.contains(&"Limited Access".to_string()));

    let executive = Role::Executive.info();
    assert!(executive.requires_credentials);
    assert_eq!(executive.description, "Executive & admin features");
}

// --- RouteClass ---

#[test]
fn test_route_class_minimum_roles() {
    assert_eq!(RouteClass::Public.minimum_role(), None);
    assert_eq!(RouteClass::Member.minimum_role(), Some(Role::Student));
    assert_eq!(RouteClass::Executive.minimum_role(), Some(Role::Executive));
}

#[test]
fn test_route_class_parse_is_exact() {
    assert_eq!("member".parse::<RouteClass>(), Ok(RouteClass::Member));
    assert_eq!(
        "Member".parse::<RouteClass>(),
        Err(AuthError::UnknownRouteClass("Member".to_string()))
    );
}

// --- Session ---

#[test]
fn test_session_validity_window_is_half_open() {
    let now = Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap();
    let session = Session::issue(Role::Student, now, Duration::minutes(15));

    assert!(!session.is_valid_at(now - Duration::seconds(1)));
    assert!(session.is_valid_at(now));
    assert!(session.is_valid_at(now + Duration::minutes(15) - Duration::milliseconds(1)));
    assert!(!session.is_valid_at(now + Duration::minutes(15)));
    assert!(session.is_expired_at(now + Duration::minutes(15)));
}

#[test]
fn test_revoked_session_is_never_valid() {
    let now = Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap();
    let mut session = Session::issue(Role::Executive, now, Duration::hours(1));
    session.revoked = true;

    assert!(!session.is_valid_at(now));
}

#[test]
fn test_session_issue_saturates_unrepresentable_expiry() {
    let now = Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap();
    let session = Session::issue(Role::Guest, now, Duration::seconds(10_000_000_000_000));

    assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
    assert!(session.is_valid_at(now));
}

// --- Payloads ---

#[test]
fn test_credentials_debug_hides_password() {
    let credentials = Credentials::new("exec@sfss.local", "hunter2");
    let rendered = format!("{credentials:?}");

    assert!(rendered.contains("exec@sfss.local"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn test_guest_login_request_without_credentials() {
    let request: LoginRequest = serde_json::from_value(json!({ "role": "guest" })).unwrap();

    assert_eq!(request.role, Role::Guest);
    assert!(request.credentials.is_none());
}

#[test]
fn test_login_request_rejects_unknown_role() {
    let result = serde_json::from_value::<LoginRequest>(json!({ "role": "superuser" }));
    assert!(result.is_err());
}

#[test]
fn test_authorize_response_shape() {
    let allowed = AuthorizeResponse::new(RouteClass::Member, Decision::Allow);
    assert_eq!(
        serde_json::to_value(&allowed).unwrap(),
        json!({ "route_class": "member", "allowed": true })
    );

    let denied = AuthorizeResponse::new(
        RouteClass::Executive,
        Decision::Deny(DenyReason::InsufficientRole),
    );
    assert_eq!(
        serde_json::to_value(&denied).unwrap(),
        json!({ "route_class": "executive", "allowed": false, "reason": "insufficient_role" })
    );
}

#[test]
fn test_session_status_serializes_phase() {
    let status = SessionStatus {
        authenticated: false,
        role: None,
        phase: sfss_session::SessionPhase::Authenticating,
    };

    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({ "authenticated": false, "role": null, "phase": "authenticating" })
    );
}

// --- AuthError ---

#[test]
fn test_error_status_codes() {
    let cases = [
        (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        (
            AuthError::RoleMismatch {
                requested: Role::Executive,
                confirmed: Role::Student,
            },
            StatusCode::FORBIDDEN,
        ),
        (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
        (AuthError::InsufficientRole, StatusCode::FORBIDDEN),
        (AuthError::UnknownRouteClass("x".into()), StatusCode::BAD_REQUEST),
        (AuthError::UnknownScreen("x".into()), StatusCode::NOT_FOUND),
        (AuthError::IdentityUnavailable("x".into()), StatusCode::BAD_GATEWAY),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status(), expected, "{error:?}");
    }
}

#[test]
fn test_role_mismatch_message_names_both_roles() {
    let error = AuthError::RoleMismatch {
        requested: Role::Executive,
        confirmed: Role::Student,
    };

    let message = error.to_string();
    assert!(message.contains("executive"));
    assert!(message.contains("student"));
}

async fn error_body(error: AuthError) -> (StatusCode, ErrorResponse) {
    let response = error.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_guard_errors_carry_redirects() {
    let (status, body) = error_body(AuthError::Unauthenticated).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.code, "unauthenticated");
    assert_eq!(body.redirect.as_deref(), Some(LOGIN_REDIRECT));

    let (status, body) = error_body(AuthError::InsufficientRole).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.redirect.as_deref(), Some(ACCESS_DENIED_REDIRECT));
}

#[tokio::test]
async fn test_login_errors_have_no_redirect() {
    let (_, body) = error_body(AuthError::InvalidCredentials).await;
    assert_eq!(body.code, "invalid_credentials");
    assert!(body.redirect.is_none());
}

#[tokio::test]
async fn test_identity_outage_detail_is_not_exposed() {
    let (status, body) =
        error_body(AuthError::IdentityUnavailable("tcp connect error 10.0.0.7".into())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body.code, "identity_unavailable");
    assert!(!body.message.contains("10.0.0.7"));
}
