//! In-memory session registry.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::model::SessionId;
use crate::domain::ports::SessionStore;

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    principal_id: Uuid,
    expires_at: Instant,
}

/// `DashMap`-backed sessions with a sliding idle lifetime.
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, SessionEntry>,
    ttl: Duration,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Drop every expired session.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, principal_id: Uuid) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                principal_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        id
    }

    fn resolve(&self, session: &SessionId) -> Option<Uuid> {
        let now = Instant::now();
        {
            let mut entry = self.sessions.get_mut(session)?;
            if entry.expires_at > now {
                entry.expires_at = now + self.ttl;
                return Some(entry.principal_id);
            }
        }
        self.sessions.remove(session);
        None
    }

    fn terminate(&self, session: &SessionId) {
        self.sessions.remove(session);
    }
}
