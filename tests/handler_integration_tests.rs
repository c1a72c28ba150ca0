use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::{Value, json};
use sfss_session::{
    AppConfig, AppState, AuthError, Credentials, Role, SessionCore, SessionStore,
    clock::SystemClock, create_router, identity::IdentityProvider, screens::ScreenTable,
};
use std::sync::Arc;
use tower::ServiceExt;

// --- Mock Identity ---

struct FixedAccounts;

#[async_trait]
impl IdentityProvider for FixedAccounts {
    async fn verify(&self, credentials: &Credentials) -> Result<Role, AuthError> {
        match (credentials.email.as_str(), credentials.password.as_str()) {
            ("student@sfss.local", "student-pass") => Ok(Role::Student),
            ("exec@sfss.local", "exec-pass") => Ok(Role::Executive),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

// --- Helpers ---

fn test_app() -> Router {
    let core = Arc::new(SessionCore::new(
        Arc::new(SessionStore::new(Arc::new(SystemClock))),
        Arc::new(FixedAccounts),
        Arc::new(ScreenTable::default()),
        Duration::hours(1),
    ));
    create_router(AppState {
        core,
        config: AppConfig::default(),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

async fn login(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/auth/login", Some(body)).await
}

fn executive_login() -> Value {
    json!({
        "role": "executive",
        "credentials": { "email": "exec@sfss.local", "password": "exec-pass" }
    })
}

fn student_login() -> Value {
    json!({
        "role": "student",
        "credentials": { "email": "student@sfss.local", "password": "student-pass" }
    })
}

// --- Public Endpoints ---

#[tokio::test]
async fn test_health_and_request_id() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_roles_lists_three_cards_in_order() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/roles", None).await;

    assert_eq!(status, StatusCode::OK);
    let roles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["guest", "student", "executive"]);
}

#[tokio::test]
async fn test_session_status_starts_unauthenticated() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/auth/session", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "authenticated": false, "role": null, "phase": "unauthenticated" })
    );
}

// --- Login Flow ---

#[tokio::test]
async fn test_guest_login_flow() {
    let app = test_app();

    let (status, session) = login(&app, json!({ "role": "guest" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["role"], "guest");
    assert_eq!(session["revoked"], false);

    let (_, status_body) = send(&app, Method::GET, "/auth/session", None).await;
    assert_eq!(status_body["authenticated"], true);
    assert_eq!(status_body["role"], "guest");
    assert_eq!(status_body["phase"], "authenticated");

    let (status, me) = send(&app, Method::GET, "/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["session_id"], session["session_id"]);
}

#[tokio::test]
async fn test_bad_credentials_return_401_without_redirect() {
    let app = test_app();

    let (status, body) = login(
        &app,
        json!({
            "role": "student",
            "credentials": { "email": "student@sfss.local", "password": "wrong" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");
    assert!(body.get("redirect").is_none());

    let (_, status_body) = send(&app, Method::GET, "/auth/session", None).await;
    assert_eq!(status_body["authenticated"], false);
}

#[tokio::test]
async fn test_role_mismatch_returns_403() {
    let app = test_app();

    let (status, body) = login(
        &app,
        json!({
            "role": "executive",
            "credentials": { "email": "student@sfss.local", "password": "student-pass" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "role_mismatch");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = test_app();
    login(&app, student_login()).await;

    let (status, _) = send(&app, Method::POST, "/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, status_body) = send(&app, Method::GET, "/auth/session", None).await;
    assert_eq!(status_body["authenticated"], false);

    let (status, body) = send(&app, Method::POST, "/auth/logout", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/auth/login");
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

// --- Authorization ---

#[tokio::test]
async fn test_authorize_reports_denial_as_answer() {
    let app = test_app();
    login(&app, json!({ "role": "guest" })).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/authorize",
        Some(json!({ "route_class": "member" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "route_class": "member", "allowed": false, "reason": "insufficient_role" })
    );
}

#[tokio::test]
async fn test_authorize_unknown_class_is_400() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/authorize",
        Some(json!({ "route_class": "treasury" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_route_class");
}

#[tokio::test]
async fn test_executive_screen_gate_for_each_caller() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/screens/executive/voting", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/auth/login");

    login(&app, student_login()).await;
    let (status, body) = send(&app, Method::GET, "/screens/executive/voting", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "insufficient_role");
    assert_eq!(body["redirect"], "/access-denied");

    login(&app, executive_login()).await;
    let (status, body) = send(&app, Method::GET, "/screens/executive/voting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "screen": "executive/voting", "route_class": "executive" })
    );
}

#[tokio::test]
async fn test_unknown_screen_is_404() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/screens/executive/treasury", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "unknown_screen");
}

#[tokio::test]
async fn test_screen_listing_grows_with_role() {
    let app = test_app();

    let (_, anonymous) = send(&app, Method::GET, "/screens", None).await;
    assert_eq!(anonymous.as_array().unwrap().len(), 4);

    login(&app, student_login()).await;
    let (_, student) = send(&app, Method::GET, "/screens", None).await;
    let screens: Vec<&str> = student
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["screen"].as_str().unwrap())
        .collect();
    assert!(screens.contains(&"marketplace"));
    assert!(!screens.iter().any(|screen| screen.starts_with("executive/")));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/auth/login").is_some());
    assert!(body["paths"].get("/screens/{screen}").is_some());
}

#[tokio::test]
async fn test_screen_name_may_be_percent_encoded() {
    let app = test_app();
    login(&app, executive_login()).await;

    let (status, body) = send(&app, Method::GET, "/screens/executive%2Fvoting", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["screen"], "executive/voting");
    assert_eq!(body["route_class"], "executive");
}

#[tokio::test]
async fn test_openapi_screen_parameter_matches_route() {
    let app = test_app();

    let (_, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    let params = body["paths"]["/screens/{screen}"]["get"]["parameters"]
        .as_array()
        .unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["name"], "screen");
    assert_eq!(params[0]["in"], "path");
}
