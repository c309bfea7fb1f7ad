//! Question→answer pair extraction and knowledge search.
//!
//! Extraction looks at strictly adjacent message pairs (i, i+1) — it never
//! re-orders messages or pairs across a gap. Multi-turn Q&A separated by
//! an acknowledgement is therefore missed; that is the specified behavior.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::knowledge::store::{KnowledgeEntry, KnowledgeStore, SemanticIndex};
use crate::signals::{SignalTables, round_to};

/// Base confidence for any accepted pair.
const BASE_CONFIDENCE: f64 = 0.5;
/// Answers shorter than this are rejected outright.
const MIN_ANSWER_CHARS: usize = 10;
/// Answers longer than this are accepted even without an indicator phrase.
const LONG_ANSWER_CHARS: usize = 50;

/// A knowledge entry annotated with a search score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
    /// Index similarity score, or keyword-overlap ratio on the fallback
    /// path.
    pub search_score: f64,
}

/// Aggregate statistics over the knowledge store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KnowledgeStats {
    pub total_entries: usize,
    pub unique_rooms: usize,
    /// Mean confidence, rounded to 2 decimal places. Zero when empty.
    pub average_confidence: f64,
}

/// Extracts Q&A pairs from conversations and maintains the searchable
/// entry collection.
pub struct KnowledgeExtractor {
    tables: Arc<SignalTables>,
    store: Arc<dyn KnowledgeStore>,
    index: Option<Arc<dyn SemanticIndex>>,
}

impl KnowledgeExtractor {
    /// Extractor with local keyword search only.
    pub fn new(tables: Arc<SignalTables>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            tables,
            store,
            index: None,
        }
    }

    /// Extractor that forwards entries to a semantic index.
    pub fn with_index(
        tables: Arc<SignalTables>,
        store: Arc<dyn KnowledgeStore>,
        index: Arc<dyn SemanticIndex>,
    ) -> Self {
        Self {
            tables,
            store,
            index: Some(index),
        }
    }

    /// Scan an ordered message sequence for adjacent question→answer pairs.
    ///
    /// Each accepted pair is appended to the store and, when an index is
    /// configured, forwarded for semantic indexing. Returns the entries
    /// emitted by this call.
    pub fn extract<S: AsRef<str>>(
        &self,
        messages: &[S],
        source: &str,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut emitted = Vec::new();

        for pair in messages.windows(2) {
            let question = pair[0].as_ref().trim();
            let answer = pair[1].as_ref().trim();

            if !self.is_question(question) || !self.is_answer(answer) {
                continue;
            }

            let confidence = self.pair_confidence(question, answer);
            let entry = KnowledgeEntry::new(question, answer, confidence, source);
            self.store.append(entry.clone())?;
            self.forward_to_index(&entry, source);
            debug!(confidence, question, "accepted Q&A pair");
            emitted.push(entry);
        }

        info!(
            count = emitted.len(),
            source, "extracted knowledge entries"
        );
        Ok(emitted)
    }

    /// Whether a message reads as a question.
    pub fn is_question(&self, message: &str) -> bool {
        let lower = message.to_lowercase();

        if self
            .tables
            .question_patterns()
            .iter()
            .any(|p| p.is_match(&lower))
        {
            return true;
        }

        self.tables
            .question_starters()
            .iter()
            .any(|starter| lower.starts_with(starter))
    }

    /// Whether a message reads as an answer.
    ///
    /// Very short messages and questions are never answers; an indicator
    /// phrase or sufficient length accepts the rest.
    pub fn is_answer(&self, message: &str) -> bool {
        if message.chars().count() < MIN_ANSWER_CHARS {
            return false;
        }
        // A question cannot answer a question.
        if self.is_question(message) {
            return false;
        }

        let lower = message.to_lowercase();
        if self
            .tables
            .answer_indicators()
            .iter()
            .any(|indicator| lower.contains(indicator))
        {
            return true;
        }

        message.chars().count() > LONG_ANSWER_CHARS
    }

    /// Search the knowledge collection.
    ///
    /// With a semantic index: query it for `2 * top_k` nearest texts,
    /// resolve each back to a stored entry by exact question/answer match,
    /// and annotate with the index's similarity score. Without one (or when
    /// it fails): keyword-overlap scoring against the local snapshot.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>, StoreError> {
        if let Some(index) = &self.index {
            match index.search(query, top_k * 2) {
                Ok(hits) => {
                    let entries = self.store.snapshot()?;
                    let mut matched = Vec::new();
                    for hit in hits {
                        if let Some(entry) = entries
                            .iter()
                            .find(|e| e.question == hit.content || e.answer == hit.content)
                        {
                            matched.push(SearchMatch {
                                entry: entry.clone(),
                                search_score: hit.score,
                            });
                        }
                    }
                    matched.truncate(top_k);
                    return Ok(matched);
                }
                Err(error) => {
                    warn!(%error, "semantic index search failed, falling back to keyword search");
                }
            }
        }
        self.keyword_search(query, top_k)
    }

    /// Filter stored entries by room and confidence, best first.
    pub fn get_entries(
        &self,
        room_filter: Option<&str>,
        min_confidence: f64,
        limit: usize,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut entries: Vec<KnowledgeEntry> = self
            .store
            .snapshot()?
            .into_iter()
            .filter(|e| room_filter.is_none_or(|room| e.source_room == room))
            .filter(|e| e.confidence >= min_confidence)
            .collect();
        entries.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Manually add an entry, bypassing the pairing heuristics.
    ///
    /// Confidence is clamped to [0, 1].
    pub fn add_entry(
        &self,
        question: &str,
        answer: &str,
        source: &str,
        confidence: f64,
    ) -> Result<KnowledgeEntry, StoreError> {
        let entry = KnowledgeEntry::new(question, answer, confidence.clamp(0.0, 1.0), source);
        self.store.append(entry.clone())?;
        self.forward_to_index(&entry, source);
        Ok(entry)
    }

    /// Aggregate statistics over the stored entries.
    pub fn stats(&self) -> Result<KnowledgeStats, StoreError> {
        let entries = self.store.snapshot()?;
        let rooms: HashSet<&str> = entries.iter().map(|e| e.source_room.as_str()).collect();
        let average = if entries.is_empty() {
            0.0
        } else {
            entries.iter().map(|e| e.confidence).sum::<f64>() / entries.len() as f64
        };
        Ok(KnowledgeStats {
            total_entries: entries.len(),
            unique_rooms: rooms.len(),
            average_confidence: round_to(average, 2),
        })
    }

    /// Confidence for an accepted pair: 0.5 base, boosted for a clear
    /// question mark, longer answers, and causal connectors; clamped to 1.
    fn pair_confidence(&self, question: &str, answer: &str) -> f64 {
        let mut confidence = BASE_CONFIDENCE;

        if question.ends_with('?') {
            confidence += 0.1;
        }

        let answer_chars = answer.chars().count();
        if answer_chars > 100 {
            confidence += 0.1;
        }
        if answer_chars > 200 {
            confidence += 0.1;
        }

        let answer_lower = answer.to_lowercase();
        if self
            .tables
            .causal_connectors()
            .iter()
            .any(|connector| answer_lower.contains(connector))
        {
            confidence += 0.1;
        }

        confidence.min(1.0)
    }

    /// Forward both texts of an entry to the semantic index; failures are
    /// logged and swallowed so indexing never blocks extraction.
    fn forward_to_index(&self, entry: &KnowledgeEntry, room: &str) {
        let Some(index) = &self.index else {
            return;
        };
        let texts = [entry.question.clone(), entry.answer.clone()];
        let metadata = serde_json::json!({ "type": "knowledge_entry", "room": room });
        if let Err(error) = index.add(&texts, metadata) {
            warn!(%error, "semantic index rejected entry, continuing unindexed");
        }
    }

    /// Local fallback: score entries by distinct-word overlap with the
    /// query, keep positive scores, best first.
    fn keyword_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchMatch>, StoreError> {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = Vec::new();
        for entry in self.store.snapshot()? {
            let text = format!("{} {}", entry.question, entry.answer).to_lowercase();
            let entry_words: HashSet<&str> = text.split_whitespace().collect();
            let overlap = query_words.intersection(&entry_words).count();
            if overlap > 0 {
                scored.push(SearchMatch {
                    search_score: overlap as f64 / query_words.len() as f64,
                    entry,
                });
            }
        }

        scored.sort_by(|a, b| {
            b.search_score
                .partial_cmp(&a.search_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
