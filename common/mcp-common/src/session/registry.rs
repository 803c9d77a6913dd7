//! Registry of live inbound sessions

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::mpsc;

use super::TransportError;

/// Opaque session identifier handed to the client in the `endpoint` event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One client's live subscription
///
/// The session owns the sending half of the queue that feeds its protocol
/// handler. Dropping the last `Session` for an id closes that queue, which is
/// how the handler learns that the client went away.
pub struct Session<I> {
    id: SessionId,
    inbound: mpsc::Sender<I>,
    created_at: DateTime<Utc>,
}

impl<I> Clone for Session<I> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inbound: self.inbound.clone(),
            created_at: self.created_at,
        }
    }
}

impl<I> Session<I> {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Queue one message for the session's handler
    ///
    /// Messages queued from the same task arrive in order. A closed queue
    /// means the handler already shut down, so the session counts as gone.
    pub async fn deliver(&self, message: I) -> Result<(), TransportError> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| TransportError::UnknownSession(self.id.to_string()))
    }
}

/// Concurrent map of session id to [`Session`]
///
/// All operations are atomic per entry; removing one session never affects
/// lookups of another.
pub struct SessionRegistry<I> {
    sessions: DashMap<SessionId, Session<I>>,
}

impl<I> Default for SessionRegistry<I> {
    fn default() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl<I> SessionRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its freshly generated id
    pub fn create(&self, inbound: mpsc::Sender<I>) -> SessionId {
        loop {
            let id = SessionId::generate();
            // A v4 collision is practically impossible, but a live id must never be replaced.
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                slot.insert(Session {
                    id: id.clone(),
                    inbound,
                    created_at: Utc::now(),
                });
                return id;
            }
        }
    }

    /// Look up a session; `None` is an expected outcome for stale ids
    pub fn get(&self, id: &str) -> Option<Session<I>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a session, returning it if it was still registered
    ///
    /// Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Session<I>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Remove every session, returning how many were live
    pub fn clear(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter()
            .filter(|id| self.remove(id.as_str()).is_some())
            .count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
