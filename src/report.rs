//! Daily digest aggregation over per-room message batches.
//!
//! Pure computation: the caller fetches messages however it likes and
//! hands them over grouped by room; this module classifies, counts, and
//! aggregates. No I/O, no summarization model.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::IntentClassifier;
use crate::signals::{IntentCategory, round_to};

/// One message inside a room batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessage {
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// All messages from one room for the report period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomBatch {
    pub room: String,
    pub messages: Vec<RoomMessage>,
}

/// Per-room section of a daily report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomReport {
    pub room: String,
    pub message_count: usize,
    pub participants: Vec<String>,
    pub participant_count: usize,
    /// Classified intent per message, in message order.
    pub intents: Vec<IntentCategory>,
    /// Messages classified as urgent.
    pub high_priority_count: usize,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Share of one intent across the whole report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentShare {
    pub intent: IntentCategory,
    pub count: usize,
    /// Percentage of all classified messages, rounded to 1 decimal place.
    pub percentage: f64,
}

/// Aggregated report over all rooms for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub room_summaries: Vec<RoomReport>,
    pub total_messages: usize,
    /// Seen intents by descending count; zero-count intents are omitted.
    pub top_intents: Vec<IntentShare>,
    pub high_priority_count: usize,
    /// Distinct senders across all rooms, sorted.
    pub participants: Vec<String>,
}

/// Builds daily reports from room batches.
pub struct ReportGenerator {
    classifier: IntentClassifier,
}

impl ReportGenerator {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self { classifier }
    }

    /// Aggregate one day's batches into a report. Empty batches are
    /// skipped entirely.
    pub fn daily_report(&self, date: NaiveDate, batches: &[RoomBatch]) -> DailyReport {
        let mut room_summaries = Vec::new();
        let mut total_messages = 0;
        let mut high_priority_count = 0;
        let mut participants = BTreeSet::new();
        let mut intent_counts = [0usize; 4];

        for batch in batches {
            if batch.messages.is_empty() {
                continue;
            }
            let summary = self.room_report(batch);

            total_messages += summary.message_count;
            high_priority_count += summary.high_priority_count;
            for message in &batch.messages {
                participants.insert(message.sender.clone());
            }
            for intent in &summary.intents {
                intent_counts[*intent as usize] += 1;
            }
            room_summaries.push(summary);
        }

        let classified: usize = intent_counts.iter().sum();
        let mut top_intents: Vec<IntentShare> = IntentCategory::ALL
            .into_iter()
            .map(|intent| (intent, intent_counts[intent as usize]))
            .filter(|(_, count)| *count > 0)
            .map(|(intent, count)| IntentShare {
                intent,
                count,
                percentage: round_to(count as f64 / classified as f64 * 100.0, 1),
            })
            .collect();
        top_intents.sort_by(|a, b| b.count.cmp(&a.count));

        DailyReport {
            date,
            generated_at: Utc::now(),
            room_summaries,
            total_messages,
            top_intents,
            high_priority_count,
            participants: participants.into_iter().collect(),
        }
    }

    fn room_report(&self, batch: &RoomBatch) -> RoomReport {
        let participants: BTreeSet<String> = batch
            .messages
            .iter()
            .map(|m| m.sender.clone())
            .collect();

        let intents: Vec<IntentCategory> = batch
            .messages
            .iter()
            .map(|m| self.classifier.classify(&m.content).intent)
            .collect();
        let high_priority_count = intents
            .iter()
            .filter(|i| **i == IntentCategory::Urgent)
            .count();

        RoomReport {
            room: batch.room.clone(),
            message_count: batch.messages.len(),
            participant_count: participants.len(),
            participants: participants.into_iter().collect(),
            intents,
            high_priority_count,
            first_message_at: batch.messages.first().map(|m| m.timestamp),
            last_message_at: batch.messages.last().map(|m| m.timestamp),
        }
    }
}
