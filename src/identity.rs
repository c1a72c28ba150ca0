use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHash, SaltString},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{
    config::ConfigError,
    error::AuthError,
    models::{Credentials, Role},
};

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// Checks a credential pair against a known identity and reports the role that identity
/// holds. The authenticator awaits this call without holding any store lock, so an
/// implementation is free to make network round-trips.
///
/// Errors: `InvalidCredentials` for an unknown identity or wrong password,
/// `IdentityUnavailable` when the check itself could not be carried out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<Role, AuthError>;
}

/// IdentityState
///
/// The shared handle to whichever identity provider the application was configured with.
pub type IdentityState = Arc<dyn IdentityProvider>;

// 2. Local Directory Implementation
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryEntry {
    pub email: String,
    /// Argon2 PHC string, see [`hash_password`].
    pub password_hash: String,
    pub role: Role,
}

/// DirectoryIdentityProvider
///
/// A fixed set of identities held in memory, keyed by lower-cased email. Loaded from a
/// JSON array of [`DirectoryEntry`] in local deployments; also the provider used in tests.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIdentityProvider {
    entries: HashMap<String, DirectoryEntry>,
}

impl DirectoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, email: &str, password_hash: impl Into<String>, role: Role) -> Self {
        self.insert(DirectoryEntry {
            email: email.to_string(),
            password_hash: password_hash.into(),
            role,
        });
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<DirectoryEntry> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let mut directory = Self::new();
        for entry in entries {
            directory.insert(entry);
        }
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.insert(entry.email.trim().to_lowercase(), entry);
    }
}

#[async_trait]
impl IdentityProvider for DirectoryIdentityProvider {
    async fn verify(&self, credentials: &Credentials) -> Result<Role, AuthError> {
        let Some(entry) = self.entries.get(&credentials.email.trim().to_lowercase()) else {
            return Err(AuthError::InvalidCredentials);
        };

        let hash = entry.password_hash.clone();
        let password = credentials.password.clone();

        // CPU-bound; runs on the blocking pool.
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;

        if matches {
            Ok(entry.role)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// hash_password
///
/// Produces an Argon2 PHC string with a random 16-byte salt, suitable for a directory entry.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|_| password_hash::Error::Crypto)?;
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed password hash in identity directory");
            false
        }
    }
}

// 3. Remote Implementation (Supabase-style password grant)
#[derive(Deserialize)]
struct TokenGrantResponse {
    user: GrantedUser,
}

#[derive(Deserialize)]
struct GrantedUser {
    #[serde(default)]
    app_metadata: RoleMetadata,
}

#[derive(Deserialize, Default)]
struct RoleMetadata {
    role: Option<String>,
}

/// HttpIdentityProvider
///
/// Verifies credentials against a hosted auth service using the password grant at
/// `{base_url}/auth/v1/token?grant_type=password`. The identity's role is read from
/// `user.app_metadata.role`.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, credentials: &Credentials) -> Result<Role, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::IdentityUnavailable(format!(
                "identity service answered {status}"
            )));
        }

        let grant = response
            .json::<TokenGrantResponse>()
            .await
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))?;

        let role = grant
            .user
            .app_metadata
            .role
            .ok_or_else(|| AuthError::IdentityUnavailable("identity has no role".to_string()))?;

        role.parse::<Role>()
            .map_err(|e| AuthError::IdentityUnavailable(e.to_string()))
    }
}
