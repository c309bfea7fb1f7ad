//! Question/answer knowledge extraction from message sequences.
//!
//! [`extractor::KnowledgeExtractor`] scans ordered message sequences for
//! question→answer adjacency and appends the pairs it finds to an
//! injectable [`store::KnowledgeStore`]. An optional semantic index
//! collaborator upgrades search from keyword overlap to nearest-neighbor.

pub mod extractor;
pub mod store;

pub use extractor::{KnowledgeExtractor, KnowledgeStats, SearchMatch};
pub use store::{IndexHit, InMemoryKnowledgeStore, KnowledgeEntry, KnowledgeStore, SemanticIndex};
