use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    clock::Clock,
    models::Session,
    persistence::{NoPersistence, SessionPersistence},
};

/// SessionStore
///
/// Holds zero or one session record. `put`, `get` and `clear` are atomic with respect
/// to each other and never fail: persistence errors are logged and the in-memory record
/// stays authoritative.
///
/// Expiry is lazy. There is no background sweep; the first `get` after `expires_at`
/// removes the record.
pub struct SessionStore {
    record: Mutex<Option<Session>>,
    clock: Arc<dyn Clock>,
    persistence: Arc<dyn SessionPersistence>,
}

impl SessionStore {
    /// An in-memory store that forgets its session on restart.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            record: Mutex::new(None),
            clock,
            persistence: Arc::new(NoPersistence),
        }
    }

    /// with_persistence
    ///
    /// Builds a store backed by `persistence` and restores the stored record unless it is
    /// expired or revoked. Anything unreadable, tampered, expired or revoked is erased.
    pub fn with_persistence(clock: Arc<dyn Clock>, persistence: Arc<dyn SessionPersistence>) -> Self {
        let now = clock.now();
        let restored = match persistence.load() {
            Ok(Some(session)) if !session.is_finished_at(now) => {
                tracing::info!(
                    session_id = %session.session_id,
                    role = %session.role,
                    "Restored persisted session"
                );
                Some(session)
            }
            Ok(Some(session)) => {
                tracing::info!(
                    session_id = %session.session_id,
                    revoked = session.revoked,
                    "Persisted session already expired or revoked"
                );
                erase_or_log(persistence.as_ref());
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                erase_or_log(persistence.as_ref());
                None
            }
        };

        Self {
            record: Mutex::new(restored),
            clock,
            persistence,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Replaces any existing record. A new login always supersedes the old session.
    pub fn put(&self, session: Session) {
        let mut record = self.record.lock();
        if let Err(e) = self.persistence.save(&session) {
            tracing::error!(error = %e, session_id = %session.session_id, "Failed to persist session");
        }
        if let Some(previous) = record.replace(session) {
            tracing::debug!(session_id = %previous.session_id, "Session superseded");
        }
    }

    /// get
    ///
    /// Returns the current record if it is still valid. An expired or revoked record is
    /// cleared as a side effect and reported as `None`. A record whose `issued_at` is
    /// still ahead of the clock (the clock stepped back) is reported as `None` but kept.
    pub fn get(&self) -> Option<Session> {
        let now = self.clock.now();
        let mut record = self.record.lock();

        if let Some(stale) = record.take_if(|session| session.is_finished_at(now)) {
            tracing::info!(
                session_id = %stale.session_id,
                role = %stale.role,
                expires_at = %stale.expires_at,
                "Session expired"
            );
            erase_or_log(self.persistence.as_ref());
            return None;
        }

        record.as_ref().filter(|session| session.is_valid_at(now)).cloned()
    }

    /// clear
    ///
    /// Removes any record and returns it marked as revoked. The revoked record is written
    /// to persistence before the erase, so a failed erase still leaves a record that will
    /// not be restored.
    pub fn clear(&self) -> Option<Session> {
        let mut record = self.record.lock();
        let removed = record.take().map(|mut session| {
            session.revoked = true;
            session
        });
        if let Some(revoked) = &removed {
            if let Err(e) = self.persistence.save(revoked) {
                tracing::error!(error = %e, session_id = %revoked.session_id, "Failed to persist revocation");
            }
        }
        erase_or_log(self.persistence.as_ref());
        removed
    }
}

fn erase_or_log(persistence: &dyn SessionPersistence) {
    if let Err(e) = persistence.erase() {
        tracing::error!(error = %e, "Failed to erase persisted session");
    }
}

/// StoreState
///
/// The shared handle to the single session store.
pub type StoreState = Arc<SessionStore>;
