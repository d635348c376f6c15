use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time source for the session store; injectable so tests can advance time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Which answer-generation model a chat session is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    Base,
    Adapter,
    Blended,
}

struct ModeEntry {
    mode: ModelMode,
    expires_at: DateTime<Utc>,
}

/// TTL cache mapping session ids to model modes.
///
/// Constructed explicitly and passed by reference to whichever layer needs
/// it; there is no ambient singleton. Reads evict expired entries.
pub struct ModeSessionStore {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, ModeEntry>>,
}

impl ModeSessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, session_id: &str, mode: ModelMode) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries()
            .insert(session_id.to_owned(), ModeEntry { mode, expires_at });
    }

    pub fn get(&self, session_id: &str) -> Option<ModelMode> {
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(session_id) {
            Some(entry) if entry.expires_at > now => Some(entry.mode),
            Some(_) => {
                entries.remove(session_id);
                None
            }
            None => None,
        }
    }

    /// Drops every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ModeEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
