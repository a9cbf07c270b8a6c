use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

pub const SESSION_COOKIE: &str = "formdesk_session";

/// Per-browser-session key/value access handed to the submission pipeline.
pub trait SessionContext: Send + Sync {
    fn get(&self, key: &str) -> Option<DateTime<Utc>>;
    fn set(&self, key: &str, at: DateTime<Utc>);
}

/// In-memory session store keyed by the session cookie.
/// Sessions idle for longer than `ttl` are forgotten.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

struct SessionEntry {
    values: HashMap<String, DateTime<Utc>>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new(now: Instant) -> Self {
        Self {
            values: HashMap::new(),
            last_seen: now,
        }
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Resume the session named by the cookie, or hand out a new id when the
    /// cookie is missing, unknown or expired. New sessions are only stored once
    /// something is written to them.
    pub fn resume(&self, id: Option<&str>) -> SessionHandle<'_> {
        let now = Instant::now();

        if let Some(id) = id {
            let live = match self.sessions.get_mut(id) {
                Some(mut entry) if now.duration_since(entry.last_seen) < self.ttl => {
                    entry.last_seen = now;
                    true
                }
                _ => false,
            };

            if live {
                return SessionHandle {
                    store: self,
                    id: id.to_string(),
                    fresh: false,
                };
            }

            if self.sessions.remove(id).is_some() {
                tracing::debug!("Session expired, starting a new one");
            }
        }

        SessionHandle {
            store: self,
            id: new_session_id(),
            fresh: true,
        }
    }

    /// Remove sessions idle for longer than the configured timeout.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let live = now.duration_since(entry.last_seen) < self.ttl;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub struct SessionHandle<'a> {
    store: &'a SessionStore,
    id: String,
    fresh: bool,
}

impl SessionHandle<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when this request started a session that now holds data,
    /// so the client must be handed the cookie.
    pub fn needs_cookie(&self) -> bool {
        self.fresh && self.store.sessions.contains_key(&self.id)
    }
}

impl SessionContext for SessionHandle<'_> {
    fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.store
            .sessions
            .get(&self.id)
            .and_then(|entry| entry.values.get(key).copied())
    }

    fn set(&self, key: &str, at: DateTime<Utc>) {
        let mut entry = self
            .store
            .sessions
            .entry(self.id.clone())
            .or_insert_with(|| SessionEntry::new(Instant::now()));
        entry.values.insert(key.to_string(), at);
    }
}

fn new_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
