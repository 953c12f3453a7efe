//! Session state and the store that owns it.
//!
//! [`SessionStore`] is the single authority for creating and mutating
//! collaborative sessions. Every mutation is a whole-field replacement: the
//! latest `set_code` wins outright, there is no diffing or merging of
//! concurrent edits. That last-write-wins rule is what the broadcast protocol
//! is built on — do not introduce merging here without changing the protocol.
//!
//! ## Concurrency
//!
//! The store maps session id to `Arc<Mutex<Session>>` behind an `RwLock`.
//! Lookup takes the read lock; only `create` takes the write lock. Mutations
//! serialize on the *target session's* mutex, so concurrent writers to the
//! same session apply in a deterministic order while sessions never block
//! each other.
//!
//! Sessions are held for the lifetime of the process. There is no eviction
//! and no persistence across restarts — accepted scope, not an oversight.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::problems::Language;
use crate::util::now_ms;

/// Buffer text every new session starts with.
pub const DEFAULT_CODE: &str = "// Start coding here...\n";

/// Language every new session starts with.
pub const DEFAULT_LANGUAGE: Language = Language::Javascript;

/// One chat message, append-only once stored.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub author: String,
    pub text: String,
    pub timestamp_ms: u64,
}

/// Shared state of one collaborative session.
///
/// `code` and `language` are initialized at creation and never become absent.
/// `participants` is a multiset of display names ordered by join time —
/// duplicates are allowed and names are not removed on disconnect.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub participants: Vec<String>,
    pub code: String,
    pub language: Language,
    pub problem: Option<String>,
    pub chat: Vec<ChatEntry>,
    pub created_at: u64,
    pub started_at: u64,
}

/// Errors surfaced by store operations.
#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The session id is unknown. Never fatal — callers turn this into a
    /// targeted `error` event or a 404.
    SessionNotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::SessionNotFound(id) => write!(f, "Session {id} not found"),
        }
    }
}

/// Owns every live session. Cloneable — clones share the same map.
///
/// Constructed once in `main` and injected through `AppState`; there is no
/// process-global session map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session with default buffer and language.
    /// Returns the new session id.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let now = now_ms();
        let session = Session {
            id: id.clone(),
            participants: Vec::new(),
            code: DEFAULT_CODE.to_string(),
            language: DEFAULT_LANGUAGE,
            problem: None,
            chat: Vec::new(),
            created_at: now,
            started_at: now,
        };
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        info!("Session {id} created, total: {}", sessions.len());
        id
    }

    /// Snapshot of a session's current state.
    pub async fn get(&self, id: &str) -> Result<Session, StoreError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    /// Whether a session exists.
    pub async fn exists(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Append a display name to the participant list (duplicates allowed).
    /// Returns the updated list.
    pub async fn append_participant(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Vec<String>, StoreError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.participants.push(name.to_string());
        Ok(session.participants.clone())
    }

    /// Replace the code buffer wholesale with `text`.
    pub async fn set_code(&self, id: &str, text: &str) -> Result<(), StoreError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.code = text.to_string();
        Ok(())
    }

    /// Replace the language selector.
    pub async fn set_language(&self, id: &str, language: Language) -> Result<(), StoreError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.language = language;
        Ok(())
    }

    /// Select a problem and replace the buffer with its starter text in one
    /// step, under a single session lock.
    pub async fn set_problem(
        &self,
        id: &str,
        problem_id: &str,
        starter: &str,
    ) -> Result<(), StoreError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        session.problem = Some(problem_id.to_string());
        session.code = starter.to_string();
        Ok(())
    }

    /// Current language of a session (used to pick starter text).
    pub async fn language(&self, id: &str) -> Result<Language, StoreError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.language)
    }

    /// Append a chat entry stamped "now". Returns the stored entry.
    pub async fn append_chat(
        &self,
        id: &str,
        author: &str,
        text: &str,
    ) -> Result<ChatEntry, StoreError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        let entry = ChatEntry {
            author: author.to_string(),
            text: text.to_string(),
            timestamp_ms: now_ms(),
        };
        session.chat.push(entry.clone());
        Ok(entry)
    }

    async fn handle(&self, id: &str) -> Result<Arc<Mutex<Session>>, StoreError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_initializes_defaults() {
        let store = SessionStore::new();
        let id = store.create().await;
        let session = store.get(&id).await.unwrap();
        assert_eq!(session.code, DEFAULT_CODE);
        assert_eq!(session.language, DEFAULT_LANGUAGE);
        assert!(session.participants.is_empty());
        assert!(session.problem.is_none());
        assert!(session.chat.is_empty());
        assert!(session.created_at > 0);
        assert_eq!(session.created_at, session.started_at);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error_without_side_effects() {
        let store = SessionStore::new();
        let err = store.set_code("nope", "x").await.unwrap_err();
        assert_eq!(err, StoreError::SessionNotFound("nope".to_string()));
        assert!(store.append_participant("nope", "ada").await.is_err());
        assert!(store.append_chat("nope", "ada", "hi").await.is_err());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_set_code_is_whole_buffer_replacement() {
        let store = SessionStore::new();
        let id = store.create().await;
        store.set_code(&id, "first").await.unwrap();
        store.set_code(&id, "second").await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().code, "second");
    }

    #[tokio::test]
    async fn test_participants_allow_duplicates_and_keep_join_order() {
        let store = SessionStore::new();
        let id = store.create().await;
        store.append_participant(&id, "ada").await.unwrap();
        store.append_participant(&id, "grace").await.unwrap();
        let users = store.append_participant(&id, "ada").await.unwrap();
        assert_eq!(users, vec!["ada", "grace", "ada"]);
    }

    #[tokio::test]
    async fn test_set_problem_replaces_buffer_with_starter() {
        let store = SessionStore::new();
        let id = store.create().await;
        store
            .set_problem(&id, "two-sum", "function twoSum() {}")
            .await
            .unwrap();
        let session = store.get(&id).await.unwrap();
        assert_eq!(session.problem.as_deref(), Some("two-sum"));
        assert_eq!(session.code, "function twoSum() {}");
    }

    #[tokio::test]
    async fn test_chat_entries_are_stamped_and_appended() {
        let store = SessionStore::new();
        let id = store.create().await;
        let entry = store.append_chat(&id, "ada", "hello").await.unwrap();
        assert_eq!(entry.author, "ada");
        assert!(entry.timestamp_ms > 0);
        let session = store.get(&id).await.unwrap();
        assert_eq!(session.chat.len(), 1);
        assert_eq!(session.chat[0].text, "hello");
    }

    #[tokio::test]
    async fn test_concurrent_writers_to_one_session_land_on_one_value() {
        let store = SessionStore::new();
        let id = store.create().await;
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store.set_code(&id, &format!("rev-{i}")).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let code = store.get(&id).await.unwrap().code;
        assert!(code.starts_with("rev-"));
    }
}
