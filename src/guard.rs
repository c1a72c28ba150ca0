use std::sync::Arc;

use crate::{
    error::AuthError,
    models::{Decision, DenyReason, Role, RouteClass, ScreenAccess},
    screens::ScreenTable,
    session_store::StoreState,
};

/// decide
///
/// The role-to-route-class matrix.
///
/// | session        | public | member             | executive          |
/// |----------------|--------|--------------------|--------------------|
/// | none           | Allow  | Deny(Unauthenticated) | Deny(Unauthenticated) |
/// | guest          | Allow  | Deny(InsufficientRole) | Deny(InsufficientRole) |
/// | student        | Allow  | Allow              | Deny(InsufficientRole) |
/// | executive      | Allow  | Allow              | Allow              |
pub fn decide(route_class: RouteClass, role: Option<Role>) -> Decision {
    match (route_class.minimum_role(), role) {
        (None, _) => Decision::Allow,
        (Some(_), None) => Decision::Deny(DenyReason::Unauthenticated),
        (Some(required), Some(role)) if role >= required => Decision::Allow,
        (Some(_), Some(_)) => Decision::Deny(DenyReason::InsufficientRole),
    }
}

/// AuthorizationGuard
///
/// Answers "may the current session open this route class?" by reading the store. The
/// guard never writes the store itself; the only mutation it can trigger is the store's
/// own lazy expiry inside `get()`.
pub struct AuthorizationGuard {
    store: StoreState,
    screens: Arc<ScreenTable>,
}

impl AuthorizationGuard {
    pub fn new(store: StoreState, screens: Arc<ScreenTable>) -> Self {
        Self { store, screens }
    }

    pub fn screens(&self) -> &ScreenTable {
        &self.screens
    }

    pub fn authorize(&self, route_class: RouteClass) -> Decision {
        let role = self.store.get().map(|session| session.role);
        let decision = decide(route_class, role);

        if let Decision::Deny(reason) = decision {
            tracing::debug!(
                route_class = %route_class,
                role = role.map(Role::as_str).unwrap_or("none"),
                ?reason,
                "Route class denied"
            );
        }

        decision
    }

    /// Like [`authorize`](Self::authorize) for a class given by name. Fails with
    /// `UnknownRouteClass` when the name is outside the classification.
    pub fn authorize_named(&self, route_class: &str) -> Result<Decision, AuthError> {
        let route_class: RouteClass = route_class.parse()?;
        Ok(self.authorize(route_class))
    }

    /// authorize_screen
    ///
    /// Looks `screen` up in the screen table and authorizes its class.
    pub fn authorize_screen(&self, screen: &str) -> Result<(RouteClass, Decision), AuthError> {
        let route_class = self
            .screens
            .class_of(screen)
            .ok_or_else(|| AuthError::UnknownScreen(screen.to_string()))?;
        Ok((route_class, self.authorize(route_class)))
    }

    /// Every screen the current session may open, in table order.
    pub fn accessible_screens(&self) -> Vec<ScreenAccess> {
        let role = self.store.get().map(|session| session.role);
        self.screens
            .iter()
            .filter(|(_, class)| decide(*class, role).is_allowed())
            .map(|(screen, route_class)| ScreenAccess {
                screen: screen.to_string(),
                route_class,
            })
            .collect()
    }
}
