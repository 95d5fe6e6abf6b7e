//! Session persistence.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{SessionError, SessionResult};
use crate::state::{SessionState, SessionTimeouts};

/// Persists session state between requests.
///
/// Implementations may use in-memory storage, a distributed cache, or a
/// database depending on deployment requirements.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session with the given id.
    ///
    /// An expired session is deleted and reported as absent.
    async fn load(&self, id: &str) -> SessionResult<Option<SessionState>>;

    /// Saves the session under its id, replacing any previous record.
    async fn save(&self, session: &SessionState) -> SessionResult<()>;

    /// Deletes the session with the given id. Missing sessions are ignored.
    async fn delete(&self, id: &str) -> SessionResult<()>;

    /// Moves the record stored under `from` to `to`.
    ///
    /// Used when the local session adopts the identity provider's session id.
    ///
    /// ## Errors
    ///
    /// Returns `SessionError::NotFound` if nothing is stored under `from`.
    async fn rename(&self, from: &str, to: &str) -> SessionResult<()>;

    // === Session Expiration ===

    /// Removes expired sessions.
    ///
    /// Returns the number of sessions removed.
    async fn remove_expired(&self) -> SessionResult<u64>;
}

/// Concurrent in-process session store.
///
/// Records are kept as JSON so that everything persisted round-trips the
/// same way it would through an external store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, String>,
    timeouts: SessionTimeouts,
}

impl InMemorySessionStore {
    /// Creates an empty store with the default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given timeouts.
    #[must_use]
    pub fn with_timeouts(timeouts: SessionTimeouts) -> Self {
        Self {
            sessions: DashMap::new(),
            timeouts,
        }
    }

    /// Returns the session timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> &SessionTimeouts {
        &self.timeouts
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Checks if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &str) -> SessionResult<Option<SessionState>> {
        let Some(raw) = self.sessions.get(id).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        let session: SessionState = serde_json::from_str(&raw)?;
        if session.is_expired(&self.timeouts) {
            self.sessions.remove(id);
            tracing::debug!(session_id = id, "Dropped expired session");
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &SessionState) -> SessionResult<()> {
        if session.id.is_empty() {
            return Err(SessionError::Invalid("empty session id".to_string()));
        }
        let raw = serde_json::to_string(session)?;
        self.sessions.insert(session.id.clone(), raw);
        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> SessionResult<()> {
        if from == to {
            return Ok(());
        }
        let (_, raw) = self
            .sessions
            .remove(from)
            .ok_or_else(|| SessionError::NotFound(from.to_string()))?;

        let mut session: SessionState = serde_json::from_str(&raw)?;
        session.id = to.to_string();
        if self.sessions.contains_key(to) {
            tracing::warn!(session_id = to, "Replacing existing session on rename");
        }
        self.sessions.insert(to.to_string(), serde_json::to_string(&session)?);

        tracing::debug!(from, to, "Session renamed");
        Ok(())
    }

    async fn remove_expired(&self) -> SessionResult<u64> {
        let mut removed = 0;
        self.sessions.retain(|_, raw| {
            let expired = serde_json::from_str::<SessionState>(raw)
                .is_ok_and(|session| session.is_expired(&self.timeouts));
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            tracing::debug!(removed, "Removed expired sessions");
        }
        Ok(removed)
    }
}
