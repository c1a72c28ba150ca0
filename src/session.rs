use chrono::Duration;
use std::sync::Arc;

use crate::{
    authenticator::Authenticator,
    error::AuthError,
    guard::AuthorizationGuard,
    identity::IdentityState,
    models::{Credentials, Decision, Role, RouteClass, Session, SessionPhase, SessionStatus},
    screens::ScreenTable,
    session_store::StoreState,
};

/// SessionCore
///
/// The single handle consumers hold: the route dispatcher asks it for decisions, the
/// login UI asks it to log in and out. It owns the authenticator and guard and shares
/// the store between them.
pub struct SessionCore {
    store: StoreState,
    authenticator: Authenticator,
    guard: AuthorizationGuard,
}

impl SessionCore {
    pub fn new(
        store: StoreState,
        identity: IdentityState,
        screens: Arc<ScreenTable>,
        ttl: Duration,
    ) -> Self {
        Self {
            authenticator: Authenticator::new(store.clone(), identity, ttl),
            guard: AuthorizationGuard::new(store.clone(), screens),
            store,
        }
    }

    pub fn store(&self) -> &StoreState {
        &self.store
    }

    pub fn guard(&self) -> &AuthorizationGuard {
        &self.guard
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    // --- Dispatcher interface ---

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.store.get().map(|session| session.role)
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.get()
    }

    pub fn authorize(&self, route_class: RouteClass) -> Decision {
        self.guard.authorize(route_class)
    }

    /// phase
    ///
    /// `Authenticating` is reported only while no valid session exists and a login is in
    /// flight. A re-login on top of a live session keeps reporting `Authenticated` for
    /// the old session until the new one replaces it.
    pub fn phase(&self) -> SessionPhase {
        self.phase_of(self.store.get().as_ref())
    }

    /// Role and phase derived from a single store read, so the two always agree.
    pub fn status(&self) -> SessionStatus {
        let session = self.store.get();
        SessionStatus {
            authenticated: session.is_some(),
            role: session.as_ref().map(|session| session.role),
            phase: self.phase_of(session.as_ref()),
        }
    }

    fn phase_of(&self, session: Option<&Session>) -> SessionPhase {
        if session.is_some() {
            SessionPhase::Authenticated
        } else if self.authenticator.in_flight() > 0 {
            SessionPhase::Authenticating
        } else {
            SessionPhase::Unauthenticated
        }
    }

    // --- Login UI interface ---

    pub async fn login(
        &self,
        role: Role,
        credentials: Option<&Credentials>,
    ) -> Result<Session, AuthError> {
        self.authenticator.login(role, credentials).await
    }

    pub fn logout(&self) {
        match self.store.clear() {
            Some(session) => tracing::info!(
                session_id = %session.session_id,
                role = %session.role,
                "Session revoked"
            ),
            None => tracing::debug!("Logout without an active session"),
        }
    }
}

/// CoreState
///
/// The shared handle to the session core, passed to every consumer.
pub type CoreState = Arc<SessionCore>;
