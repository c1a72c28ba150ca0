use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf};
use uuid::Uuid;

use crate::models::{Role, Session};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// SessionPersistence
///
/// Backing storage for the single session record. Implementations are synchronous:
/// the store calls them while holding its lock, so they must complete promptly.
pub trait SessionPersistence: Send + Sync {
    /// Returns the stored record, `None` if nothing is stored.
    fn load(&self) -> Result<Option<Session>, PersistenceError>;
    fn save(&self, session: &Session) -> Result<(), PersistenceError>;
    fn erase(&self) -> Result<(), PersistenceError>;
}

/// Keeps nothing; the session dies with the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl SessionPersistence for NoPersistence {
    fn load(&self) -> Result<Option<Session>, PersistenceError> {
        Ok(None)
    }

    fn save(&self, _session: &Session) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn erase(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// PersistedClaims
///
/// Token payload written to disk. Timestamps are kept in milliseconds so a restored
/// session expires at exactly the same instant as the original.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedClaims {
    sid: Uuid,
    role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    iat_ms: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    exp_ms: DateTime<Utc>,
    // A logged-out record stays on disk if the erase fails; this keeps it dead.
    #[serde(default)]
    revoked: bool,
}

/// FilePersistence
///
/// Stores the session as an HS256-signed token under one well-known path. The signature
/// stops a hand-edited file from upgrading its role; a file that fails verification is
/// reported as a `Token` error and the store discards it.
pub struct FilePersistence {
    path: PathBuf,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>, secret: &str) -> Self {
        Self {
            path: path.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is the store's job, with millisecond precision.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl SessionPersistence for FilePersistence {
    fn load(&self) -> Result<Option<Session>, PersistenceError> {
        let token = match fs::read_to_string(&self.path) {
            Ok(token) => token,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let data = decode::<PersistedClaims>(token.trim(), &self.decoding_key, &Self::validation())?;
        let claims = data.claims;

        Ok(Some(Session {
            session_id: claims.sid,
            role: claims.role,
            issued_at: claims.iat_ms,
            expires_at: claims.exp_ms,
            revoked: claims.revoked,
        }))
    }

    fn save(&self, session: &Session) -> Result<(), PersistenceError> {
        let claims = PersistedClaims {
            sid: session.session_id,
            role: session.role,
            iat_ms: session.issued_at,
            exp_ms: session.expires_at,
            revoked: session.revoked,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        // Readers only ever see a complete token.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn erase(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
