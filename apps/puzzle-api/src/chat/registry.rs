//! Registry of active chat sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::sink::ChatSink;

pub type SharedSink = Arc<dyn ChatSink>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("session {0} is already active")]
pub struct DuplicateSessionError(pub String);

/// Counters reported by `/health` and connection logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub active: usize,
    pub joined: u64,
    pub left: u64,
}

/// Shared map of session id to outbound sink.
///
/// `DashMap` shards the map so joins and leaves on different sessions do not
/// contend. No method sends on a sink; callers work from [`snapshot`].
///
/// [`snapshot`]: ConnectionRegistry::snapshot
pub struct ConnectionRegistry {
    sessions: DashMap<String, SharedSink>,
    joined: AtomicU64,
    left: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            joined: AtomicU64::new(0),
            left: AtomicU64::new(0),
        }
    }

    /// Register a session. An existing entry with the same id is left untouched.
    pub fn join(&self, session_id: String, sink: SharedSink) -> Result<(), DuplicateSessionError> {
        match self.sessions.entry(session_id) {
            Entry::Occupied(existing) => Err(DuplicateSessionError(existing.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(sink);
                self.joined.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Remove a session. Returns whether it was present.
    pub fn leave(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            self.left.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Point-in-time copy of all sessions, ordered by id.
    pub fn snapshot(&self) -> Vec<(String, SharedSink)> {
        let mut entries: Vec<(String, SharedSink)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active: self.sessions.len(),
            joined: self.joined.load(Ordering::Relaxed),
            left: self.left.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::RecordingSink;

    fn sink() -> SharedSink {
        Arc::new(RecordingSink::new())
    }

    #[test]
    fn join_and_leave() {
        let registry = ConnectionRegistry::new();
        registry.join("a".into(), sink()).unwrap();
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 1);

        assert!(registry.leave("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn leave_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.join("a".into(), sink()).unwrap();
        assert!(!registry.leave("b"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().left, 0);
    }

    #[test]
    fn repeated_leave_counts_once() {
        let registry = ConnectionRegistry::new();
        registry.join("a".into(), sink()).unwrap();

        assert!(registry.leave("a"));
        assert!(!registry.leave("a"));

        let stats = registry.stats();
        assert_eq!(stats.joined, 1);
        assert_eq!(stats.left, 1);
        assert_eq!(stats.active, 0);
    }

    #[test]
    fn duplicate_join_keeps_existing_entry() {
        let registry = ConnectionRegistry::new();
        let first = sink();
        registry.join("a".into(), Arc::clone(&first)).unwrap();

        let err = registry.join("a".into(), sink()).unwrap_err();
        assert_eq!(err, DuplicateSessionError("a".into()));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(Arc::ptr_eq(&snapshot[0].1, &first));
        assert_eq!(registry.stats().joined, 1);
    }

    #[test]
    fn snapshot_is_sorted_and_detached() {
        let registry = ConnectionRegistry::new();
        for id in ["c", "a", "b"] {
            registry.join(id.into(), sink()).unwrap();
        }

        let snapshot = registry.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        // Mutating the registry does not affect a snapshot already taken.
        registry.leave("a");
        registry.join("d".into(), sink()).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].0, "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_join_leave_stays_consistent() {
        use rand::Rng;

        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for task in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                for round in 0..50 {
                    let id = format!("s{task}-{round}");
                    registry.join(id.clone(), sink()).unwrap();
                    let yields = rand::thread_rng().gen_range(0..3);
                    for _ in 0..yields {
                        tokio::task::yield_now().await;
                    }
                    let _ = registry.snapshot();
                    assert!(registry.leave(&id));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let stats = registry.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.joined, 32 * 50);
        assert_eq!(stats.left, 32 * 50);
    }
}
