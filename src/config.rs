use std::{env, path::PathBuf};

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECS: i64 = 365 * DEFAULT_SESSION_TTL_SECS;

const LOCAL_SESSION_SECRET: &str = "sfss-local-session-secret-not-for-production";

/// AppConfig
///
/// Immutable configuration read once at startup and shared through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which secrets are mandatory.
    pub env: Env,
    // Socket address the HTTP adapter listens on.
    pub bind_addr: String,
    // Lifetime of an issued session, in seconds.
    pub session_ttl_secs: i64,
    // HMAC key signing the persisted session file.
    pub session_secret: String,
    // Where the single session record is persisted. `None` keeps it in memory only.
    pub session_file: Option<PathBuf>,
    // Base URL of the hosted identity service. Takes precedence over the local directory.
    pub identity_url: Option<String>,
    pub identity_api_key: Option<String>,
    // JSON file of known identities for local deployments.
    pub identity_directory: Option<PathBuf>,
    // JSON file replacing the built-in screen table.
    pub screen_table_path: Option<PathBuf>,
}

/// Env
///
/// Local runs get pretty logs and fallback secrets; production demands every secret explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Failures reading the auxiliary JSON files named by the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("identity service URL is set but IDENTITY_API_KEY is missing")]
    MissingIdentityKey,
}

impl Default for AppConfig {
    /// Non-panicking values for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_file: None,
            identity_url: None,
            identity_api_key: None,
            identity_directory: None,
            screen_table_path: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `SESSION_SECRET`, `IDENTITY_URL` or
    /// `IDENTITY_API_KEY` is missing, and in any environment when `SESSION_TTL_SECS`
    /// is not an integer between 1 and [`MAX_SESSION_TTL_SECS`]. The service must not
    /// start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 && secs <= MAX_SESSION_TTL_SECS => secs,
                _ => panic!(
                    "FATAL: SESSION_TTL_SECS must be an integer in 1..={MAX_SESSION_TTL_SECS}, got {raw:?}"
                ),
            },
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let session_file = env::var("SESSION_FILE").ok().map(PathBuf::from);
        let screen_table_path = env::var("SCREEN_TABLE_PATH").ok().map(PathBuf::from);

        match env {
            Env::Local => Self {
                env: Env::Local,
                bind_addr,
                session_ttl_secs,
                session_secret: env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
                session_file,
                identity_url: env::var("IDENTITY_URL").ok(),
                identity_api_key: env::var("IDENTITY_API_KEY").ok(),
                identity_directory: env::var("IDENTITY_DIRECTORY").ok().map(PathBuf::from),
                screen_table_path,
            },
            Env::Production => Self {
                env: Env::Production,
                bind_addr,
                session_ttl_secs,
                session_secret: env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
                session_file,
                identity_url: Some(
                    env::var("IDENTITY_URL").expect("FATAL: IDENTITY_URL required in prod"),
                ),
                identity_api_key: Some(
                    env::var("IDENTITY_API_KEY").expect("FATAL: IDENTITY_API_KEY required in prod"),
                ),
                // Production verifies against the hosted service only.
                identity_directory: None,
                screen_table_path,
            },
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }
}
