//! Knowledge entry storage and the semantic index collaborator.
//!
//! The store is append-only from the core's point of view: entries are
//! never mutated or deleted here (removal is a caller-owned operation on
//! the backing storage).

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

// ── Entry ───────────────────────────────────────────────────────────

/// An extracted question/answer pair with confidence and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Question text, trimmed.
    pub question: String,
    /// Answer text, trimmed.
    pub answer: String,
    /// Extraction confidence in [0, 1].
    pub confidence: f64,
    /// Room (or other source identifier) the pair came from.
    pub source_room: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Create a new entry with a fresh ID, stamped now.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        confidence: f64,
        source_room: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            confidence,
            source_room: source_room.into(),
            created_at: Utc::now(),
        }
    }
}

// ── Store trait ─────────────────────────────────────────────────────

/// Backend-agnostic, append-only store for knowledge entries.
///
/// Implementations must serialize concurrent appends and give readers a
/// consistent snapshot — a reader never observes a partially constructed
/// entry. Callers can substitute a durable backend without touching
/// extraction logic.
pub trait KnowledgeStore: Send + Sync {
    /// Append a new entry. The core never mutates or deletes entries.
    fn append(&self, entry: KnowledgeEntry) -> Result<(), StoreError>;

    /// Consistent snapshot of all entries, in insertion order.
    fn snapshot(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize, StoreError>;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// In-memory store: a vector behind a read/write lock.
///
/// Appends take the write lock; snapshots clone under the read lock, so
/// readers never block writers beyond the copy.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KnowledgeStore for InMemoryKnowledgeStore {
    fn append(&self, entry: KnowledgeEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.len())
    }
}

// ── Semantic index collaborator ─────────────────────────────────────

/// One nearest-neighbor hit from the semantic index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Indexed text that matched.
    pub content: String,
    /// Similarity score as reported by the index.
    pub score: f64,
}

/// Optional external nearest-neighbor text index.
///
/// Not owned by this crate. Any failure is caught at the call site and
/// the extractor degrades to its local keyword path, so implementations
/// are free to fail fast.
pub trait SemanticIndex: Send + Sync {
    /// Index the given texts with shared metadata.
    fn add(&self, texts: &[String], metadata: serde_json::Value) -> anyhow::Result<()>;

    /// Nearest entries for a query, best first.
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<IndexHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_snapshot_preserve_insertion_order() {
        let store = InMemoryKnowledgeStore::new();
        store
            .append(KnowledgeEntry::new("q1?", "a1", 0.5, "room1"))
            .unwrap();
        store
            .append(KnowledgeEntry::new("q2?", "a2", 0.7, "room2"))
            .unwrap();

        let entries = store.snapshot().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "q1?");
        assert_eq!(entries[1].question, "q2?");
        assert_eq!(store.len().unwrap(), 2);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = InMemoryKnowledgeStore::new();
        store
            .append(KnowledgeEntry::new("q?", "a", 0.5, "room"))
            .unwrap();
        let before = store.snapshot().unwrap();
        store
            .append(KnowledgeEntry::new("q2?", "a2", 0.5, "room"))
            .unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn concurrent_appends_are_serialized() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryKnowledgeStore::new());
        let mut handles = Vec::new();
        for worker in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    store
                        .append(KnowledgeEntry::new(
                            format!("q{worker}-{i}?"),
                            "some answer",
                            0.5,
                            "room",
                        ))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len().unwrap(), 8 * 50);
    }

    #[test]
    fn entry_serializes_with_provenance() {
        let entry = KnowledgeEntry::new("How?", "Like this, basically.", 0.6, "room1");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["question"], "How?");
        assert_eq!(json["source_room"], "room1");
        assert!(json["created_at"].is_string());
    }
}
