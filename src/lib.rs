//! Triage core — the decision engines of a message-triage pipeline.
//!
//! Three multi-signal heuristic scorers over immutable signal tables:
//!
//! - [`intent::IntentClassifier`] — intent classification with a
//!   normalized score distribution and deterministic tie-breaking.
//! - [`priority::PriorityRanker`] — 0–10 urgency scoring and stable
//!   ranking of message batches.
//! - [`knowledge::KnowledgeExtractor`] — question→answer extraction from
//!   adjacent messages, with keyword or semantic search over the results.
//!
//! All scoring is pure and synchronous. Optional collaborators (NLP
//! annotator, semantic index) only ever adjust magnitudes or upgrade
//! search; their absence or failure never breaks a call.

pub mod error;
pub mod intent;
pub mod knowledge;
pub mod priority;
pub mod report;
pub mod signals;

pub use error::{Error, Result};
