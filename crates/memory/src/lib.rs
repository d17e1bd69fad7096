//! Session memory store — bounded per-session conversation history.
//!
//! Histories live for the process lifetime only; restarting loses all
//! context. Two bounds apply: turns per session (FIFO eviction of the
//! oldest turn) and live sessions per store (eviction of the
//! oldest-created session).
//!
//! Concurrency model: the map is guarded by an async `RwLock`; each
//! session carries its own `Mutex` around the history. Callers that need
//! a read-provider-append sequence to be atomic for one session hold that
//! session's guard across the whole exchange, while other sessions stay
//! fully concurrent.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use voxlog_core::Turn;

/// One session's ordered history, bounded to `max_turns`.
///
/// `max_turns` of 0 is legal: every push is immediately discarded and the
/// session behaves statelessly.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl SessionHistory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest first if the bound would be
    /// exceeded. This is the only mutation path; the length invariant
    /// (`len() <= max_turns`) holds on every return.
    pub fn push(&mut self, turn: Turn) {
        if self.max_turns == 0 {
            return;
        }
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Owned snapshot of the turns in insertion order.
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// A registered session: creation time plus its locked history.
pub struct Session {
    created_at: DateTime<Utc>,
    history: Mutex<SessionHistory>,
}

impl Session {
    fn new(max_turns: usize) -> Self {
        Self {
            created_at: Utc::now(),
            history: Mutex::new(SessionHistory::new(max_turns)),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Acquire this session's history guard. Holding it serializes every
    /// chat exchange for the session; other sessions are unaffected.
    pub async fn lock(&self) -> MutexGuard<'_, SessionHistory> {
        self.history.lock().await
    }
}

/// The store mapping session ids to histories.
///
/// Passed by handle to the orchestrator; nothing else mutates histories.
pub struct SessionStore {
    max_turns: usize,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            max_turns,
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the session for `session_id`, registering an empty one if
    /// absent. When the session cap is reached, the oldest-created
    /// session is evicted to make room.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(session_id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        // Re-check: another task may have registered it between locks.
        if let Some(session) = sessions.get(session_id) {
            return session.clone();
        }

        if sessions.len() >= self.max_sessions {
            if let Some(oldest_key) = sessions
                .iter()
                .min_by_key(|(_, s)| s.created_at)
                .map(|(k, _)| k.clone())
            {
                debug!(session_id = %oldest_key, "Session cap reached, evicting oldest session");
                sessions.remove(&oldest_key);
            }
        }

        let session = Arc::new(Session::new(self.max_turns));
        sessions.insert(session_id.to_string(), session.clone());
        session
    }

    /// Append one turn to a session, registering the session if needed.
    pub async fn append(&self, session_id: &str, turn: Turn) {
        let session = self.get_or_create(session_id).await;
        session.lock().await.push(turn);
    }

    /// Read-only snapshot of a session's history. Unknown ids yield an
    /// empty sequence and do not register the session.
    pub async fn get_history(&self, session_id: &str) -> Vec<Turn> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };
        match session {
            Some(session) => session.lock().await.turns(),
            None => Vec::new(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxlog_core::Role;

    #[test]
    fn history_bounded_to_max_turns() {
        let mut history = SessionHistory::new(5);
        for i in 0..7 {
            history.push(Turn::user(format!("entry {i}")));
            history.push(Turn::assistant(format!("reply {i}")));
        }
        // 14 appends against a bound of 5: only the most recent 5 remain.
        assert_eq!(history.len(), 5);
        let turns = history.turns();
        assert_eq!(turns[0].text, "reply 4");
        assert_eq!(turns[4].text, "reply 6");
    }

    #[test]
    fn history_preserves_insertion_order() {
        let mut history = SessionHistory::new(10);
        history.push(Turn::user("first"));
        history.push(Turn::assistant("second"));
        history.push(Turn::user("third"));
        let turns = history.turns();
        assert_eq!(turns[0].text, "first");
        assert_eq!(turns[1].text, "second");
        assert_eq!(turns[2].text, "third");
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut history = SessionHistory::new(0);
        history.push(Turn::user("hello"));
        history.push(Turn::assistant("hi"));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_yields_empty_history() {
        let store = SessionStore::new(5, 100);
        assert!(store.get_history("nobody").await.is_empty());
        // Reading must not register the session.
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new(5, 100);
        store.append("a", Turn::user("message for a")).await;

        assert_eq!(store.get_history("a").await.len(), 1);
        assert!(store.get_history("b").await.is_empty());
    }

    #[tokio::test]
    async fn session_ids_are_case_sensitive() {
        let store = SessionStore::new(5, 100);
        store.append("Alice", Turn::user("hello")).await;
        assert!(store.get_history("alice").await.is_empty());
    }

    #[tokio::test]
    async fn store_eviction_keeps_most_recent_turns() {
        let store = SessionStore::new(5, 100);
        for i in 0..7 {
            store.append("s", Turn::user(format!("u{i}"))).await;
            store.append("s", Turn::assistant(format!("a{i}"))).await;
        }
        let turns = store.get_history("s").await;
        assert_eq!(turns.len(), 5);
        assert_eq!(turns.last().unwrap().text, "a6");
        assert_eq!(turns.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn session_cap_evicts_oldest_created() {
        let store = SessionStore::new(5, 2);
        store.append("first", Turn::user("one")).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.append("second", Turn::user("two")).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.append("third", Turn::user("three")).await;

        assert_eq!(store.session_count().await, 2);
        assert!(store.get_history("first").await.is_empty());
        assert_eq!(store.get_history("third").await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_to_different_sessions() {
        let store = Arc::new(SessionStore::new(5, 100));

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("session-{i}");
                for j in 0..5 {
                    store.append(&id, Turn::user(format!("m{j}"))).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.session_count().await, 10);
        for i in 0..10 {
            assert_eq!(store.get_history(&format!("session-{i}")).await.len(), 5);
        }
    }

    #[tokio::test]
    async fn held_guard_serializes_same_session() {
        let store = Arc::new(SessionStore::new(10, 100));
        let session = store.get_or_create("s").await;

        let mut guard = session.lock().await;
        guard.push(Turn::user("first"));

        // A second writer must wait for the guard before its append lands.
        let store2 = store.clone();
        let writer = tokio::spawn(async move {
            store2.append("s", Turn::user("second")).await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        guard.push(Turn::assistant("still first"));
        drop(guard);

        writer.await.unwrap();
        let turns = store.get_history("s").await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text, "first");
        assert_eq!(turns[1].text, "still first");
        assert_eq!(turns[2].text, "second");
    }
}
