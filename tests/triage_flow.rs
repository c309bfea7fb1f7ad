//! End-to-end flow: classify → rank → extract → search, wired the way a
//! surrounding service would wire the core.

use std::sync::Arc;

use triage_core::intent::IntentClassifier;
use triage_core::knowledge::{InMemoryKnowledgeStore, KnowledgeExtractor};
use triage_core::priority::PriorityRanker;
use triage_core::signals::{IntentCategory, SignalTables};

fn conversation() -> Vec<&'static str> {
    vec![
        "hey team, good morning",
        "How do I reset my password?",
        "You can reset it from account settings, because it's self-service.",
        "thanks!",
        "URGENT: checkout is down, customers can't pay, need help now!!!",
        "on it",
        "What's the price of the premium plan?",
        "Basically it's $49 a month, you can upgrade from the billing page.",
    ]
}

#[test]
fn full_pipeline_over_a_conversation() {
    let tables = Arc::new(SignalTables::standard().unwrap());
    let classifier = Arc::new(IntentClassifier::new(Arc::clone(&tables)));
    let ranker = PriorityRanker::with_classifier(Arc::clone(&tables), Arc::clone(&classifier));
    let store = Arc::new(InMemoryKnowledgeStore::new());
    let extractor = KnowledgeExtractor::new(Arc::clone(&tables), store);

    let messages = conversation();

    // Classification: every message gets a result, distribution is total.
    let results = classifier.batch_classify(&messages);
    assert_eq!(results.len(), messages.len());
    let distribution = classifier.intent_distribution(&messages);
    assert_eq!(distribution.total(), messages.len());
    assert!(distribution.get(IntentCategory::Urgent) >= 1);

    // Ranking: the outage floats to the top with a high score.
    let ranked = ranker.rank(&messages);
    assert_eq!(ranked.len(), messages.len());
    assert!(ranked[0].content.contains("checkout is down"));
    assert!(ranked[0].score >= 6.0);
    assert!(ranked.iter().all(|s| s.score >= 0.0 && s.score <= 10.0));
    for window in ranked.windows(2) {
        assert!(window[0].score >= window[1].score);
    }

    // Extraction: both Q&A pairs are adjacent, so both are captured.
    let entries = extractor.extract(&messages, "support-room").unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.confidence >= 0.0 && e.confidence <= 1.0));
    assert_eq!(entries[0].question, "How do I reset my password?");
    assert_eq!(entries[1].question, "What's the price of the premium plan?");

    // Search: keyword fallback finds the password entry.
    let matches = extractor.search("reset password", 3).unwrap();
    assert!(!matches.is_empty());
    assert!(matches[0].entry.question.contains("password"));

    // Entry listing honors the confidence threshold.
    let confident = extractor.get_entries(Some("support-room"), 0.6, 10).unwrap();
    assert!(confident.iter().all(|e| e.confidence >= 0.6));
}

#[test]
fn ranking_agrees_with_classification() {
    let tables = Arc::new(SignalTables::standard().unwrap());
    let classifier = Arc::new(IntentClassifier::new(Arc::clone(&tables)));
    let ranker = PriorityRanker::with_classifier(Arc::clone(&tables), Arc::clone(&classifier));

    for message in conversation() {
        let classified = classifier.classify(message);
        let scored = ranker.score_message(message);
        assert_eq!(scored.intent, classified.intent);
    }
}
