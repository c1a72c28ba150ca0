use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AuthError;

// --- Roles & Route Classes ---

/// Role
///
/// The privilege tier a session is issued for. Variants are declared in ascending
/// privilege order, so the derived `Ord` is the privilege ordering:
/// `Guest < Student < Executive`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Guest,
    Student,
    Executive,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Guest, Role::Student, Role::Executive];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Student => "student",
            Role::Executive => "executive",
        }
    }

    /// Guests pick their role without presenting credentials.
    pub fn requires_credentials(self) -> bool {
        !matches!(self, Role::Guest)
    }

    /// info
    ///
    /// The descriptive card shown for this role on the login screen.
    pub fn info(self) -> RoleInfo {
        let (title, description, features): (&str, &str, &[&str]) = match self {
            Role::Guest => (
                "Guest",
                "Browse events and clubs",
                &["View Events", "Browse Clubs", "Limited Access"],
            ),
            Role::Student => (
                "Student",
                "Full student access",
                &["RSVP Events", "Join Clubs", "Marketplace"],
            ),
            Role::Executive => (
                "Executive",
                "Executive & admin features",
                &["All Student Features", "Executive Portal", "Admin Access"],
            ),
        };

        RoleInfo {
            role: self,
            title: title.to_string(),
            description: description.to_string(),
            features: features.iter().map(|f| f.to_string()).collect(),
            requires_credentials: self.requires_credentials(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "student" => Ok(Role::Student),
            "executive" => Ok(Role::Executive),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// RouteClass
///
/// Static classification of screens by the minimum role required to open them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RouteClass {
    /// Login and guest-visible screens.
    Public,
    /// Requires `student` or `executive`.
    Member,
    /// Requires `executive`.
    Executive,
}

impl RouteClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteClass::Public => "public",
            RouteClass::Member => "member",
            RouteClass::Executive => "executive",
        }
    }

    /// The least privileged role admitted to this class. `None` means no session is needed.
    pub fn minimum_role(self) -> Option<Role> {
        match self {
            RouteClass::Public => None,
            RouteClass::Member => Some(Role::Student),
            RouteClass::Executive => Some(Role::Executive),
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteClass {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(RouteClass::Public),
            "member" => Ok(RouteClass::Member),
            "executive" => Ok(RouteClass::Executive),
            other => Err(AuthError::UnknownRouteClass(other.to_string())),
        }
    }
}

// --- Session ---

/// Session
///
/// A time-bounded proof of an authenticated role. Valid only while
/// `issued_at <= now < expires_at` and not revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Session {
    pub session_id: Uuid,
    pub role: Role,
    #[ts(type = "string")]
    pub issued_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Session {
    /// Issues a fresh session for `role` starting at `now` and lasting `ttl`. A lifetime
    /// past the representable range ends at `DateTime::<Utc>::MAX_UTC`.
    pub fn issue(role: Role, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            role,
            issued_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            revoked: false,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Revoked or expired: the record can never become valid again.
    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked || self.is_expired_at(now)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.issued_at <= now && !self.is_expired_at(now)
    }
}

// --- Authorization Decisions ---

/// Why the guard refused a route class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DenyReason {
    Unauthenticated,
    InsufficientRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into the matching typed error.
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(AuthError::Unauthenticated),
            Decision::Deny(DenyReason::InsufficientRole) => Err(AuthError::InsufficientRole),
        }
    }
}

/// Observable position in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// Email/password pair checked by the identity provider. The password is never logged;
/// the `Debug` implementation redacts it.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    #[schema(example = "exec@sfss.local")]
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// LoginRequest
///
/// Input payload for POST /auth/login. `credentials` is ignored for the guest role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub credentials: Option<Credentials>,
}

/// AuthorizeRequest
///
/// Input payload for POST /authorize. The class arrives as a raw string so that an
/// unrecognised class is reported as `unknown_route_class` instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorizeRequest {
    #[schema(example = "member")]
    pub route_class: String,
}

// --- Output Schemas ---

/// Login screen card for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleInfo {
    pub role: Role,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub requires_credentials: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub phase: SessionPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorizeResponse {
    pub route_class: RouteClass,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub reason: Option<DenyReason>,
}

impl AuthorizeResponse {
    pub fn new(route_class: RouteClass, decision: Decision) -> Self {
        let reason = match decision {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        };
        Self {
            route_class,
            allowed: reason.is_none(),
            reason,
        }
    }
}

/// A screen together with the route class that gates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ScreenAccess {
    #[schema(example = "executive/voting")]
    pub screen: String,
    pub route_class: RouteClass,
}

/// ErrorResponse
///
/// Body of every non-2xx JSON response. `redirect` tells the dispatcher where to send the
/// user instead of showing the raw message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub redirect: Option<String>,
}
