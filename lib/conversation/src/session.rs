//! Conversation session management.
//!
//! Sessions hold a visitor's message history. A session is created on the
//! first request carrying its key and lives as long as the process.

use crate::error::SessionError;
use crate::message::Message;
use async_trait::async_trait;
use persona_core::{Result, SessionKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Key the client uses for this session.
    pub key: SessionKey,
    /// Messages in this session.
    pub messages: Vec<Message>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            messages: Vec::new(),
        }
    }

    /// Appends a batch of messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Returns true if no message has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Exclusive access to one session for the duration of a turn.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Trait for session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Locks the session for `key`, creating it if needed.
    ///
    /// Holders of the guard for one key are serialised; different keys do
    /// not contend.
    async fn acquire(&self, key: &SessionKey) -> Result<SessionGuard, SessionError>;

    /// Returns a copy of the committed history, or `None` for an unknown
    /// key.
    async fn snapshot(&self, key: &SessionKey) -> Result<Option<Vec<Message>>, SessionError>;

    /// Returns the number of known sessions.
    async fn session_count(&self) -> usize;
}

/// Process-lifetime session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: &SessionKey) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(key.clone()))))
            .clone()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn acquire(&self, key: &SessionKey) -> Result<SessionGuard, SessionError> {
        let slot = self.slot(key).await;
        Ok(slot.lock_owned().await)
    }

    async fn snapshot(&self, key: &SessionKey) -> Result<Option<Vec<Message>>, SessionError> {
        let slot = self.sessions.lock().await.get(key).cloned();
        match slot {
            Some(slot) => Ok(Some(slot.lock().await.messages.clone())),
            None => Ok(None),
        }
    }

    async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn session_extend_keeps_order() {
        let mut session = Session::new(SessionKey::default());
        assert!(session.is_empty());

        session.extend(vec![Message::user("Hello!"), Message::assistant("Hi there")]);

        assert!(!session.is_empty());
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages[0].content, "Hello!");
        assert_eq!(session.messages[1].content, "Hi there");
    }

    #[tokio::test]
    async fn sessions_are_created_lazily() {
        let store = InMemorySessionStore::new();
        let key = SessionKey::new("visitor-1");

        assert!(store.snapshot(&key).await.expect("snapshot").is_none());
        assert_eq!(store.session_count().await, 0);

        let session = store.acquire(&key).await.expect("acquire");
        assert!(session.is_empty());
        drop(session);

        assert_eq!(store.session_count().await, 1);
        let history = store.snapshot(&key).await.expect("snapshot");
        assert!(history.is_some_and(|messages| messages.is_empty()));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let alice = SessionKey::new("alice");
        let bob = SessionKey::new("bob");

        store
            .acquire(&alice)
            .await
            .expect("acquire")
            .extend(vec![Message::user("I am Alice")]);

        let bob_history = store.acquire(&bob).await.expect("acquire");
        assert!(bob_history.is_empty());
        drop(bob_history);

        let alice_history = store.snapshot(&alice).await.expect("snapshot").expect("exists");
        assert_eq!(alice_history.len(), 1);
        assert_eq!(alice_history[0].content, "I am Alice");
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let store = Arc::new(InMemorySessionStore::new());
        let key = SessionKey::new("shared");

        let held = store.acquire(&key).await.expect("acquire");

        let contender = {
            let store = store.clone();
            let key = key.clone();
            tokio::spawn(async move { store.acquire(&key).await.ok().map(|s| s.message_count()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        // Another key proceeds while the first is held.
        let other = store.acquire(&SessionKey::new("other")).await.expect("acquire");
        drop(other);

        drop(held);
        let count = contender.await.expect("join").expect("acquire");
        assert_eq!(count, 0);
    }
}
