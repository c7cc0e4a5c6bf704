//! In-memory session store keyed by opaque session ids.
//!
//! Each session holds a small string attribute map and an idle deadline. Any
//! access through a [`Session`] handle pushes the deadline forward; expired
//! entries are dropped on lookup and by [`SessionStore::purge_expired`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug)]
struct SessionEntry {
    attributes: HashMap<String, String>,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionEntry>>,
    idle: Duration,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            idle,
        }
    }

    /// Starts an empty session and returns its handle.
    pub fn create(&self) -> Session {
        let id = uuid::Uuid::new_v4().to_string();
        self.inner.insert(
            id.clone(),
            SessionEntry {
                attributes: HashMap::new(),
                expires_at: Instant::now() + self.idle,
            },
        );
        Session {
            id,
            store: self.clone(),
        }
    }

    /// Returns a handle for a live session, refreshing its idle deadline.
    pub fn load(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let mut entry = self.inner.get_mut(id)?;
            if entry.expires_at > now {
                entry.expires_at = now + self.idle;
                return Some(Session {
                    id: id.to_string(),
                    store: self.clone(),
                });
            }
        }
        self.inner.remove(id);
        None
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.inner.len())
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    fn attribute(&self, id: &str, key: &str) -> Option<String> {
        let entry = self.inner.get(id)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        entry.attributes.get(key).cloned()
    }

    /// Writes into a live session. Returns false, without writing, when the
    /// session has expired or been purged.
    fn set_attribute(&self, id: &str, key: &str, value: String) -> bool {
        let now = Instant::now();
        {
            let Some(mut entry) = self.inner.get_mut(id) else {
                return false;
            };
            if entry.expires_at > now {
                entry.expires_at = now + self.idle;
                entry.attributes.insert(key.to_string(), value);
                return true;
            }
        }
        self.inner.remove(id);
        false
    }
}

/// Handle to one client's session, passed explicitly to whoever reads or
/// writes its attributes.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.attribute(&self.id, key)
    }

    /// Sets an attribute. Returns false when the session is no longer live.
    pub fn insert(&self, key: &str, value: impl Into<String>) -> bool {
        self.store.set_attribute(&self.id, key, value.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SessionStore;

    #[test]
    fn attributes_are_visible_through_a_reloaded_handle() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create();
        session.insert("user", "admin");

        let reloaded = store.load(session.id());
        assert_eq!(
            reloaded.and_then(|s| s.get("user")),
            Some(String::from("admin"))
        );
    }

    #[test]
    fn sessions_are_isolated_from_each_other() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.create();
        let second = store.create();
        first.insert("user", "admin");

        assert_ne!(first.id(), second.id());
        assert_eq!(second.get("user"), None);
    }

    #[test]
    fn unknown_id_does_not_load() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.load("not-a-session").is_none());
    }

    #[test]
    fn expired_session_is_dropped_on_load() {
        let store = SessionStore::new(Duration::ZERO);
        let session = store.create();
        std::thread::sleep(Duration::from_millis(5));

        assert!(store.load(session.id()).is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn purge_removes_only_expired_sessions() {
        let expiring = SessionStore::new(Duration::ZERO);
        expiring.create();
        expiring.create();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(expiring.purge_expired(), 2);
        assert_eq!(expiring.count(), 0);

        let live = SessionStore::new(Duration::from_secs(60));
        live.create();
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.count(), 1);
    }

    #[test]
    fn write_to_purged_session_does_not_recreate_it() {
        let store = SessionStore::new(Duration::ZERO);
        let session = store.create();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.purge_expired(), 1);

        assert!(!session.insert("user", "admin"));
        assert_eq!(store.count(), 0);
        assert!(store.load(session.id()).is_none());
    }

    #[test]
    fn write_to_expired_session_does_not_revive_old_attributes() {
        let store = SessionStore::new(Duration::from_millis(20));
        let session = store.create();
        assert!(session.insert("user", "admin"));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(session.get("user"), None);

        assert!(!session.insert("theme", "dark"));
        assert_eq!(session.get("user"), None);
        assert_eq!(store.count(), 0);
        assert!(store.load(session.id()).is_none());
    }

    #[test]
    fn write_to_live_session_succeeds() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create();
        assert!(session.insert("user", "admin"));
        assert_eq!(session.get("user"), Some(String::from("admin")));
    }
}
