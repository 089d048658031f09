//! Persisted chat list
//!
//! All sessions live in a single record ([`CHATS_KEY`]) as a JSON array,
//! most recently saved first and capped at [`MAX_HISTORY`] entries. Saving is
//! a read-modify-write of that array.

use super::RecordStore;
use crate::error::{ChatError, Result};
use crate::session::ChatSession;

/// Record key holding the chat list
pub const CHATS_KEY: &str = "chats";

/// Upper bound on stored sessions
pub const MAX_HISTORY: usize = 50;

/// View of the chat list in a record store
pub struct ChatHistory<'a> {
    store: &'a dyn RecordStore,
    limit: usize,
}

impl<'a> ChatHistory<'a> {
    /// Chat list capped at [`MAX_HISTORY`]
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self::with_limit(store, MAX_HISTORY)
    }

    /// Chat list with a smaller cap; values above [`MAX_HISTORY`] are clamped
    pub fn with_limit(store: &'a dyn RecordStore, limit: usize) -> Self {
        Self {
            store,
            limit: limit.clamp(1, MAX_HISTORY),
        }
    }

    /// All stored sessions, most recent first
    pub fn list(&self) -> Result<Vec<ChatSession>> {
        let Some(raw) = self.store.get(CHATS_KEY)? else {
            return Ok(Vec::new());
        };
        let sessions: Vec<ChatSession> = serde_json::from_str(&raw)
            .map_err(|e| ChatError::Storage(format!("Malformed chat list: {}", e)))?;
        Ok(sessions)
    }

    /// Save a session
    ///
    /// An existing entry with the same id is replaced where it stands;
    /// a new session goes to the front. Entries past the cap are evicted.
    pub fn save(&self, session: &ChatSession) -> Result<()> {
        let mut sessions = self.list()?;

        match sessions.iter().position(|s| s.id == session.id) {
            Some(idx) => sessions[idx] = session.clone(),
            None => sessions.insert(0, session.clone()),
        }

        if sessions.len() > self.limit {
            let evicted = sessions.len() - self.limit;
            sessions.truncate(self.limit);
            tracing::debug!("Evicted {} chat(s) past the history cap", evicted);
        }

        let raw = serde_json::to_string(&sessions).map_err(ChatError::from)?;
        self.store.set(CHATS_KEY, &raw)?;
        tracing::debug!("Saved chat {} ({} stored)", session.id, sessions.len());
        Ok(())
    }

    /// Find a session by exact id, or by id prefix when unambiguous
    pub fn find(&self, id: &str) -> Result<Option<ChatSession>> {
        let sessions = self.list()?;
        if let Some(exact) = sessions.iter().find(|s| s.id == id) {
            return Ok(Some(exact.clone()));
        }

        let mut matches = sessions.into_iter().filter(|s| s.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(only), None) if !id.is_empty() => Ok(Some(only)),
            _ => Ok(None),
        }
    }
}
