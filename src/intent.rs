//! Heuristic intent classification over short free-text messages.
//!
//! Scores text against the keyword/pattern tables for every category,
//! normalizes into a probability-like distribution, and picks the arg-max
//! category. An optional NLP annotator can nudge raw scores before
//! normalization; classification works identically without it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::signals::{IntentCategory, IntentScores, SignalTables, round_to};

/// Points per keyword literally contained in the text.
const KEYWORD_POINTS: f64 = 1.0;
/// Points per matching pattern.
const PATTERN_POINTS: f64 = 2.0;

// ── NLP annotator collaborator ──────────────────────────────────────

/// Structured signals produced by an external NLP annotator.
#[derive(Debug, Clone, Default)]
pub struct NlpAnnotation {
    /// Text ends with a question mark (after trimming).
    pub ends_with_question_mark: bool,
    /// Lemma of the root verb, if the annotator found one.
    pub root_verb_lemma: Option<String>,
    /// Named-entity type labels found in the text (e.g. "MONEY", "DATE").
    pub entity_types: Vec<String>,
}

/// Optional NLP collaborator — pure enhancement, never required.
///
/// A failing or absent annotator must not change the set of categories the
/// classifier can return, only raw score magnitudes. Failures are caught at
/// the call site and treated as "annotator absent".
pub trait NlpAnnotator: Send + Sync {
    fn annotate(&self, text: &str) -> anyhow::Result<NlpAnnotation>;
}

// ── Classification result ───────────────────────────────────────────

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Highest-scoring category (ties resolve to the earliest declared).
    pub intent: IntentCategory,
    /// Normalized score of the winning category, in [0, 1].
    pub confidence: f64,
    /// Normalized score per category. Sums to 1.0 whenever at least one
    /// signal fired; all zeros otherwise.
    pub scores: IntentScores,
}

impl ClassificationResult {
    /// Defined fallback for empty or whitespace-only input.
    fn empty_input() -> Self {
        Self {
            intent: IntentCategory::Casual,
            confidence: 0.0,
            scores: IntentScores::default(),
        }
    }
}

/// Count of classified messages per category.
///
/// Every declared category is always present (zero if unseen), and the
/// counts sum to the batch length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntentDistribution([usize; 4]);

impl IntentDistribution {
    /// Count for one category.
    pub fn get(&self, category: IntentCategory) -> usize {
        self.0[category as usize]
    }

    /// Total messages counted.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Iterate (category, count) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (IntentCategory, usize)> + '_ {
        IntentCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    fn bump(&mut self, category: IntentCategory) {
        self.0[category as usize] += 1;
    }
}

// ── Classifier ──────────────────────────────────────────────────────

/// Multi-signal heuristic intent classifier.
pub struct IntentClassifier {
    tables: Arc<SignalTables>,
    annotator: Option<Arc<dyn NlpAnnotator>>,
}

impl IntentClassifier {
    /// Keyword/pattern-only classifier.
    pub fn new(tables: Arc<SignalTables>) -> Self {
        Self {
            tables,
            annotator: None,
        }
    }

    /// Classifier with an NLP annotator boost.
    pub fn with_annotator(tables: Arc<SignalTables>, annotator: Arc<dyn NlpAnnotator>) -> Self {
        Self {
            tables,
            annotator: Some(annotator),
        }
    }

    /// Classify one message.
    ///
    /// Empty or whitespace-only input returns the casual/0.0 fallback —
    /// a defined output, never an error. All returned floats are rounded
    /// to 3 decimal places.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().is_empty() {
            return ClassificationResult::empty_input();
        }

        let lower = text.to_lowercase();
        let mut raw = IntentScores::default();

        for category in IntentCategory::ALL {
            let signals = self.tables.intent(category);
            let mut score = 0.0;
            for keyword in &signals.keywords {
                if lower.contains(keyword) {
                    score += KEYWORD_POINTS;
                }
            }
            for pattern in &signals.patterns {
                if pattern.is_match(&lower) {
                    score += PATTERN_POINTS;
                }
            }
            raw.set(category, score * signals.weight);
        }

        self.apply_annotator_boost(text, &mut raw);

        // Guard the division when no signal fired for any category.
        let total = match raw.sum() {
            t if t == 0.0 => 1.0,
            t => t,
        };
        let normalized = raw.map(|v| v / total);
        let intent = normalized.argmax();

        ClassificationResult {
            intent,
            confidence: round_to(normalized.get(intent), 3),
            scores: normalized.map(|v| round_to(v, 3)),
        }
    }

    /// Classify a batch, preserving input order.
    pub fn batch_classify<S: AsRef<str>>(&self, messages: &[S]) -> Vec<ClassificationResult> {
        messages.iter().map(|m| self.classify(m.as_ref())).collect()
    }

    /// Count winning intents across a batch.
    pub fn intent_distribution<S: AsRef<str>>(&self, messages: &[S]) -> IntentDistribution {
        let mut distribution = IntentDistribution::default();
        for message in messages {
            distribution.bump(self.classify(message.as_ref()).intent);
        }
        distribution
    }

    /// Additive-only annotator boost. Errors are logged and ignored so a
    /// broken collaborator degrades to the keyword/pattern-only path.
    fn apply_annotator_boost(&self, text: &str, raw: &mut IntentScores) {
        let Some(annotator) = &self.annotator else {
            return;
        };
        let annotation = match annotator.annotate(text) {
            Ok(annotation) => annotation,
            Err(error) => {
                warn!(%error, "NLP annotator failed, continuing keyword-only");
                return;
            }
        };

        if annotation.ends_with_question_mark {
            raw.add(IntentCategory::Support, 1.5);
        }
        if let Some(lemma) = annotation.root_verb_lemma.as_deref() {
            match lemma {
                "help" | "fix" | "solve" | "assist" => raw.add(IntentCategory::Support, 1.0),
                "buy" | "get" | "order" | "subscribe" => raw.add(IntentCategory::Sales, 1.0),
                _ => {}
            }
        }
        for entity in &annotation.entity_types {
            match entity.as_str() {
                "MONEY" | "PERCENT" => raw.add(IntentCategory::Sales, 1.0),
                "TIME" | "DATE" => raw.add(IntentCategory::Urgent, 0.5),
                _ => {}
            }
        }
    }
}
