//! Urgency scoring and stable ranking of message batches.
//!
//! Five independently computed components sum into a single 0–10 score.
//! Ranking is a stable descending sort: equal-score messages keep their
//! original (FIFO) order, which downstream consumers rely on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::intent::IntentClassifier;
use crate::signals::{IntentCategory, SignalTables, round_to};

/// The intent component counts double in the total.
const INTENT_MULTIPLIER: f64 = 2.0;
/// Scores are clamped to this ceiling.
const MAX_SCORE: f64 = 10.0;

// ── Score types ─────────────────────────────────────────────────────

/// Per-component contributions to a priority score, before the intent
/// multiplier and the 10.0 clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub intent: f64,
    pub keyword: f64,
    pub pattern: f64,
    pub length: f64,
    pub question: f64,
}

/// A scored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Original message text.
    pub content: String,
    /// Urgency score in [0, 10], rounded to 2 decimal places.
    pub score: f64,
    /// Classified intent (casual with confidence 0 when no classifier is
    /// configured).
    pub intent: IntentCategory,
    /// Classifier confidence for the winning intent.
    pub intent_confidence: f64,
    /// Urgency keywords found in the text, in first-seen (table) order.
    pub urgency_keywords: Vec<String>,
    /// Component contributions for display and debugging.
    pub breakdown: ScoreBreakdown,
}

/// Bucketed counts of ranked scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    /// Score >= 6.
    pub high: usize,
    /// Score >= 3 and < 6.
    pub medium: usize,
    /// Score < 3.
    pub low: usize,
}

// ── Ranker ──────────────────────────────────────────────────────────

/// Combines intent classification with lexical and structural signals
/// into a single urgency score per message.
pub struct PriorityRanker {
    tables: Arc<SignalTables>,
    classifier: Option<Arc<IntentClassifier>>,
}

impl PriorityRanker {
    /// Ranker without a classifier: every message scores as casual intent
    /// with zero confidence.
    pub fn new(tables: Arc<SignalTables>) -> Self {
        Self {
            tables,
            classifier: None,
        }
    }

    /// Ranker that consumes an intent classifier as a sub-routine.
    pub fn with_classifier(tables: Arc<SignalTables>, classifier: Arc<IntentClassifier>) -> Self {
        Self {
            tables,
            classifier: Some(classifier),
        }
    }

    /// Score and sort a batch, highest priority first.
    ///
    /// The sort is stable: messages with equal scores retain their input
    /// order.
    pub fn rank<S: AsRef<str>>(&self, messages: &[S]) -> Vec<PriorityScore> {
        let mut scored: Vec<PriorityScore> = messages
            .iter()
            .map(|m| self.score_message(m.as_ref()))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored
    }

    /// Bucket a batch into high / medium / low priority counts.
    pub fn priority_distribution<S: AsRef<str>>(&self, messages: &[S]) -> PriorityDistribution {
        let mut distribution = PriorityDistribution::default();
        for scored in self.rank(messages) {
            if scored.score >= 6.0 {
                distribution.high += 1;
            } else if scored.score >= 3.0 {
                distribution.medium += 1;
            } else {
                distribution.low += 1;
            }
        }
        distribution
    }

    /// The top `n` messages of the ranked batch.
    pub fn top_n<S: AsRef<str>>(&self, messages: &[S], n: usize) -> Vec<PriorityScore> {
        let mut ranked = self.rank(messages);
        ranked.truncate(n);
        ranked
    }

    /// Score a single message.
    pub fn score_message(&self, message: &str) -> PriorityScore {
        let lower = message.to_lowercase();

        // 1. Intent component
        let (intent, intent_confidence) = match &self.classifier {
            Some(classifier) => {
                let result = classifier.classify(message);
                (result.intent, result.confidence)
            }
            None => (IntentCategory::Casual, 0.0),
        };
        let intent_score = self.tables.priority_weight(intent) * (0.5 + intent_confidence);

        // 2. Keyword component, recording matches in table order
        let mut keyword_score = 0.0;
        let mut urgency_keywords = Vec::new();
        for &(keyword, weight) in self.tables.urgency_keywords() {
            if lower.contains(keyword) {
                keyword_score += weight;
                urgency_keywords.push(keyword.to_string());
            }
        }

        // 3. Pattern component
        let pattern_score = self.pattern_score(message);

        // 4. Length bonus: longer messages may need attention
        let length = message.chars().count();
        let length_score = (length as f64 / 200.0).min(1.0) * 0.5;

        // 5. Question indicator
        let question_score = if message.contains('?') { 1.0 } else { 0.0 };

        let total = intent_score * INTENT_MULTIPLIER
            + keyword_score
            + pattern_score
            + length_score
            + question_score;

        PriorityScore {
            content: message.to_string(),
            score: round_to(total.min(MAX_SCORE), 2),
            intent,
            intent_confidence: round_to(intent_confidence, 2),
            urgency_keywords,
            breakdown: ScoreBreakdown {
                intent: round_to(intent_score, 2),
                keyword: round_to(keyword_score, 2),
                pattern: round_to(pattern_score, 2),
                length: round_to(length_score, 2),
                question: question_score,
            },
        }
    }

    /// Structural urgency signals: shouting, repetition, time pressure,
    /// negative sentiment. Each pattern counts at most once.
    fn pattern_score(&self, message: &str) -> f64 {
        let mut score = 0.0;

        if self.tables.exclamation_run().is_match(message) {
            score += 1.0;
        }

        let length = message.chars().count();
        let caps = message.chars().filter(|c| c.is_uppercase()).count();
        let caps_ratio = caps as f64 / length.max(1) as f64;
        if caps_ratio > 0.3 && length > 10 {
            score += 1.5;
        }

        for pattern in self.tables.time_patterns() {
            if pattern.is_match(message) {
                score += 0.5;
            }
        }

        for pattern in self.tables.negative_patterns() {
            if pattern.is_match(message) {
                score += 0.3;
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentClassifier;

    fn tables() -> Arc<SignalTables> {
        Arc::new(SignalTables::standard().unwrap())
    }

    fn ranker_with_classifier() -> PriorityRanker {
        let tables = tables();
        let classifier = Arc::new(IntentClassifier::new(Arc::clone(&tables)));
        PriorityRanker::with_classifier(tables, classifier)
    }

    #[test]
    fn urgent_outage_ranks_first_and_high() {
        let ranker = ranker_with_classifier();
        let messages = [
            "hey",
            "system is down, URGENT, need help now!!!",
            "thanks",
        ];
        let ranked = ranker.rank(&messages);
        assert_eq!(ranked[0].content, messages[1]);
        assert!(ranked[0].score >= 6.0);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let ranker = ranker_with_classifier();
        let messages = [
            "",
            "ok",
            "URGENT EMERGENCY CRITICAL broken down failed error blocked stuck deadline now today ASAP!!! please help immediately, everything is not working and we can't ship by 5pm???",
        ];
        for scored in ranker.rank(&messages) {
            assert!(scored.score >= 0.0 && scored.score <= 10.0);
        }
        // the keyword-stuffed message saturates the clamp
        let stuffed = ranker.score_message(messages[2]);
        assert_eq!(stuffed.score, 10.0);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        // No classifier, identical structure: same score for both.
        let ranker = PriorityRanker::new(tables());
        let ranked = ranker.rank(&["aaa", "bbb"]);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].content, "aaa");
        assert_eq!(ranked[1].content, "bbb");
    }

    #[test]
    fn more_urgency_keywords_never_lower_the_score() {
        let ranker = ranker_with_classifier();
        let base = ranker.score_message("please review the report");
        let more = ranker.score_message("please review the urgent report");
        let most = ranker.score_message("please review the urgent critical report");
        assert!(more.score >= base.score);
        assert!(most.score >= more.score);
    }

    #[test]
    fn urgency_keywords_recorded_in_table_order() {
        let ranker = PriorityRanker::new(tables());
        let scored = ranker.score_message("help, this is urgent and critical");
        assert_eq!(scored.urgency_keywords, vec!["urgent", "critical", "help"]);
    }

    #[test]
    fn question_component_fires_on_question_mark() {
        let ranker = PriorityRanker::new(tables());
        assert_eq!(ranker.score_message("is it ready?").breakdown.question, 1.0);
        assert_eq!(ranker.score_message("it is ready").breakdown.question, 0.0);
    }

    #[test]
    fn shouting_adds_caps_bonus() {
        let ranker = PriorityRanker::new(tables());
        let shouting = ranker.score_message("WHERE IS MY ORDER");
        let calm = ranker.score_message("where is my order");
        assert!(shouting.breakdown.pattern >= calm.breakdown.pattern + 1.5);
    }

    #[test]
    fn repeated_exclamations_add_bonus() {
        let ranker = PriorityRanker::new(tables());
        let loud = ranker.score_message("ship it!!");
        let quiet = ranker.score_message("ship it!");
        assert!((loud.breakdown.pattern - quiet.breakdown.pattern - 1.0).abs() < 1e-9);
    }

    #[test]
    fn time_and_negative_patterns_count_once_each() {
        let ranker = PriorityRanker::new(tables());
        // "today" twice still counts once; "error" twice still counts once
        let once = ranker.score_message("finish today, the error remains");
        let twice = ranker.score_message("finish today today, the error error remains");
        assert_eq!(once.breakdown.pattern, twice.breakdown.pattern);
    }

    #[test]
    fn length_bonus_caps_at_half_point() {
        let ranker = PriorityRanker::new(tables());
        let long = "x".repeat(500);
        assert_eq!(ranker.score_message(&long).breakdown.length, 0.5);
    }

    #[test]
    fn no_classifier_defaults_to_casual_intent() {
        let ranker = PriorityRanker::new(tables());
        let scored = ranker.score_message("URGENT help!!!");
        assert_eq!(scored.intent, IntentCategory::Casual);
        assert_eq!(scored.intent_confidence, 0.0);
    }

    #[test]
    fn distribution_buckets_by_threshold() {
        let ranker = PriorityRanker::new(tables());
        let messages = [
            "urgent deadline today!!!", // high: 3.0 + 2.5 + 1.0 keywords alone
            "error today",              // medium
            "hello",                    // low
        ];
        let distribution = ranker.priority_distribution(&messages);
        assert_eq!(distribution.high, 1);
        assert_eq!(distribution.medium, 1);
        assert_eq!(distribution.low, 1);
    }

    #[test]
    fn top_n_truncates_ranked_output() {
        let ranker = ranker_with_classifier();
        let messages = ["hey", "URGENT: prod is down!!!", "thanks", "quick question?"];
        let top = ranker.top_n(&messages, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].content, "URGENT: prod is down!!!");
    }

    #[test]
    fn empty_batch_ranks_empty() {
        let ranker = ranker_with_classifier();
        assert!(ranker.rank::<&str>(&[]).is_empty());
        let distribution = ranker.priority_distribution::<&str>(&[]);
        assert_eq!(distribution, PriorityDistribution::default());
    }
}
