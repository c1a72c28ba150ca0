//! Router Module Index
//!
//! Splits the HTTP surface by what it needs from the caller. Access to screens is decided
//! by the guard inside the handlers; these modules only separate "anyone" from
//! "someone is logged in".

/// Routes accessible without a session: login, status and guard queries.
pub mod public;

/// Routes behind the `require_session` layer.
pub mod session;
