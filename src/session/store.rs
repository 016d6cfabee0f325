// Server-side session storage
// Sessions are keyed by a random UUID carried in a cookie

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Values kept per browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub visits: Option<u32>,
    pub last_visit: Option<DateTime<Utc>>,
}

/// A session loaded for the duration of one request
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: Option<Uuid>,
    data: SessionData,
    modified: bool,
}

impl Session {
    pub const fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub const fn data(&self) -> &SessionData {
        &self.data
    }

    /// Mutable access marks the session for saving
    pub fn data_mut(&mut self) -> &mut SessionData {
        self.modified = true;
        &mut self.data
    }

    pub const fn is_modified(&self) -> bool {
        self.modified
    }
}

struct Entry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// In-memory session map with a fixed time-to-live
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Load the session named by a cookie value
    ///
    /// Unknown, malformed or expired ids yield a fresh, unsaved session.
    pub async fn load(&self, cookie_value: Option<&str>) -> Session {
        let Some(id) = cookie_value.and_then(|v| Uuid::parse_str(v).ok()) else {
            return Session::default();
        };

        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(entry) if entry.expires_at > Utc::now() => Session {
                id: Some(id),
                data: entry.data.clone(),
                modified: false,
            },
            _ => Session::default(),
        }
    }

    /// Persist a session, returning the id the cookie should carry
    ///
    /// Untouched new sessions are not stored and return `None`.
    pub async fn save(&self, session: Session) -> Option<Uuid> {
        if session.id.is_none() && !session.modified {
            return None;
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut sessions = self.sessions.write().await;

        let id = match session.id {
            Some(id) => id,
            None => {
                sessions.retain(|_, entry| entry.expires_at > now);
                Uuid::new_v4()
            }
        };
        sessions.insert(
            id,
            Entry {
                data: session.data,
                expires_at,
            },
        );
        Some(id)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_untouched_session_not_saved() {
        let store = SessionStore::new(Duration::days(1));
        let session = store.load(None).await;
        assert!(store.save(session).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_roundtrip_through_cookie_value() {
        let store = SessionStore::new(Duration::days(1));
        let mut session = store.load(None).await;
        session.data_mut().visits = Some(3);
        let id = store.save(session).await.unwrap();

        let reloaded = store.load(Some(&id.to_string())).await;
        assert_eq!(reloaded.id(), Some(id));
        assert_eq!(reloaded.data().visits, Some(3));
        assert!(!reloaded.is_modified());
    }

    #[tokio::test]
    async fn test_garbage_cookie_gives_fresh_session() {
        let store = SessionStore::new(Duration::days(1));
        let session = store.load(Some("not-a-uuid")).await;
        assert!(session.id().is_none());
        let session = store.load(Some(&Uuid::new_v4().to_string())).await;
        assert!(session.id().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_dropped() {
        let store = SessionStore::new(Duration::seconds(-1));
        let mut session = store.load(None).await;
        session.data_mut().visits = Some(1);
        let id = store.save(session).await.unwrap();

        let reloaded = store.load(Some(&id.to_string())).await;
        assert!(reloaded.id().is_none());
        assert_eq!(reloaded.data().visits, None);
    }
}
