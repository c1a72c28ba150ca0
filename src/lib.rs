use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session & authorization core.
pub mod authenticator;
pub mod clock;
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod persistence;
pub mod screens;
pub mod session;
pub mod session_store;

// Configuration and the HTTP adapter in front of the core.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod routes;

use routes::{public, session as session_router};

// --- Public Re-exports ---

pub use config::{AppConfig, ConfigError};
pub use error::AuthError;
pub use models::{Credentials, Decision, DenyReason, Role, RouteClass, Session, SessionPhase};
pub use session::{CoreState, SessionCore};
pub use session_store::{SessionStore, StoreState};

use clock::SystemClock;
use identity::{DirectoryIdentityProvider, HttpIdentityProvider, IdentityState};
use persistence::{FilePersistence, NoPersistence, SessionPersistence};
use screens::ScreenTable;

/// ApiDoc
///
/// OpenAPI document for the HTTP adapter, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::list_roles, handlers::login, handlers::logout,
        handlers::session_status, handlers::get_me, handlers::authorize,
        handlers::list_screens, handlers::open_screen
    ),
    components(
        schemas(
            models::Role, models::RouteClass, models::Session, models::DenyReason,
            models::SessionPhase, models::Credentials, models::LoginRequest,
            models::AuthorizeRequest, models::RoleInfo, models::SessionStatus,
            models::AuthorizeResponse, models::ScreenAccess, models::ErrorResponse,
        )
    ),
    tags(
        (name = "sfss-session", description = "SFSS session & route authorization API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler can reach: the session core and the configuration it was built
/// from. Cloning is cheap; the core is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub core: CoreState,
    pub config: AppConfig,
}

impl FromRef<AppState> for CoreState {
    fn from_ref(app_state: &AppState) -> CoreState {
        app_state.core.clone()
    }
}

/// build_state
///
/// Wires the core from configuration:
/// - identity: the hosted service when `identity_url` is set, else the JSON directory,
///   else an empty directory (only guests can sign in).
/// - persistence: a signed session file when `session_file` is set.
/// - screens: the JSON table when `screen_table_path` is set, else the built-in table.
pub fn build_state(config: AppConfig) -> Result<AppState, ConfigError> {
    // 1. Identity Source
    // The hosted service takes precedence; production never configures a directory.
    let identity: IdentityState = match (&config.identity_url, &config.identity_directory) {
        (Some(url), _) => {
            let api_key = config
                .identity_api_key
                .as_deref()
                .ok_or(ConfigError::MissingIdentityKey)?;
            tracing::info!(identity_url = %url, "Using hosted identity service");
            Arc::new(HttpIdentityProvider::new(url, api_key))
        }
        (None, Some(path)) => {
            let directory = DirectoryIdentityProvider::from_json_file(path)?;
            tracing::info!(path = %path.display(), identities = directory.len(), "Loaded identity directory");
            Arc::new(directory)
        }
        (None, None) => {
            tracing::warn!("No identity source configured; only guest logins will succeed");
            Arc::new(DirectoryIdentityProvider::new())
        }
    };

    // 2. Session Persistence
    // A signed file survives restarts; without one the session dies with the process.
    let persistence: Arc<dyn SessionPersistence> = match &config.session_file {
        Some(path) => Arc::new(FilePersistence::new(path, &config.session_secret)),
        None => Arc::new(NoPersistence),
    };

    // 3. Screen Table
    let screens = match &config.screen_table_path {
        Some(path) => ScreenTable::from_json_file(path)?,
        None => ScreenTable::default(),
    };

    // 4. Core Assembly
    // The store restores any persisted session here, before the first request.
    let store = Arc::new(SessionStore::with_persistence(Arc::new(SystemClock), persistence));
    let core = Arc::new(SessionCore::new(
        store,
        identity,
        Arc::new(screens),
        config.session_ttl(),
    ));

    Ok(AppState { core, config })
}

/// create_router
///
/// Assembles the routers, the session layer and the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The mobile front-end calls from its own origin.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: login, status polling and every guard query.
        .merge(public::public_routes())
        // Session Routes: rejected with 401 by `require_session` when nothing is signed in.
        .merge(
            session_router::session_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_session,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with its ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
