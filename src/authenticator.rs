use chrono::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    error::AuthError,
    identity::IdentityState,
    models::{Credentials, Role, Session},
    session_store::StoreState,
};

/// Authenticator
///
/// Validates a login request and, on success, issues a session into the store.
///
/// The store is written exactly once per successful call and never on failure. The
/// identity check is awaited before the store is touched, so dropping the login future
/// mid-check leaves the previous session (or its absence) exactly as it was.
pub struct Authenticator {
    store: StoreState,
    identity: IdentityState,
    ttl: Duration,
    in_flight: AtomicUsize,
}

impl Authenticator {
    pub fn new(store: StoreState, identity: IdentityState, ttl: Duration) -> Self {
        Self {
            store,
            identity,
            ttl,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of login calls currently between entry and completion.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// login
    ///
    /// - `Guest`: always succeeds; credentials are ignored.
    /// - `Student` / `Executive`: credentials are required and checked by the identity
    ///   provider. The requested role may not exceed the identity's confirmed role
    ///   (`RoleMismatch`); an executive may still sign in as a student.
    ///
    /// The issued session carries the requested role. Concurrent logins race on the final
    /// `put`; the last one wins.
    pub async fn login(
        &self,
        role: Role,
        credentials: Option<&Credentials>,
    ) -> Result<Session, AuthError> {
        let _attempt = InFlight::enter(&self.in_flight);

        if role.requires_credentials() {
            let credentials = credentials.ok_or(AuthError::InvalidCredentials)?;

            let confirmed = match self.identity.verify(credentials).await {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    tracing::warn!(
                        requested = %role,
                        email = %credentials.email,
                        error = %e,
                        "Login rejected by identity provider"
                    );
                    return Err(e);
                }
            };

            if role > confirmed {
                tracing::warn!(
                    requested = %role,
                    confirmed = %confirmed,
                    email = %credentials.email,
                    "Login rejected: role exceeds identity"
                );
                return Err(AuthError::RoleMismatch {
                    requested: role,
                    confirmed,
                });
            }
        }

        let session = Session::issue(role, self.store.clock().now(), self.ttl);
        self.store.put(session.clone());

        tracing::info!(
            session_id = %session.session_id,
            role = %session.role,
            expires_at = %session.expires_at,
            "Session issued"
        );

        Ok(session)
    }
}

// Decrements on drop, so a cancelled login stops counting as in flight.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
