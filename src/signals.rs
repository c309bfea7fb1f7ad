//! Immutable signal tables — keyword lists, regex patterns, and weights.
//!
//! [`SignalTables`] is the process-wide configuration for all three scoring
//! engines. It is built once at startup via [`SignalTables::standard`],
//! which compiles and validates every pattern, and is then shared read-only
//! (typically behind an `Arc`). It is never mutated after construction.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

// ── Intent categories ───────────────────────────────────────────────

/// Fixed set of message-purpose labels.
///
/// Declaration order is significant: score ties resolve to the earliest
/// declared category, and batch distributions report categories in this
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    Urgent,
    Support,
    Sales,
    Casual,
}

impl IntentCategory {
    /// All categories in declaration (tie-break) order.
    pub const ALL: [IntentCategory; 4] = [
        IntentCategory::Urgent,
        IntentCategory::Support,
        IntentCategory::Sales,
        IntentCategory::Casual,
    ];

    /// Lower-case labels, aligned with [`IntentCategory::ALL`].
    pub const LABELS: [&'static str; 4] = ["urgent", "support", "sales", "casual"];

    /// Lower-case label for logging and serialization.
    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }

    /// Parse a lower-case label back into a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Score vector ────────────────────────────────────────────────────

/// Fixed-size score vector keyed by [`IntentCategory`].
///
/// Every category is always present with a default of 0.0 — there is no
/// "missing key" state. Serializes as a map of label → score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntentScores([f64; 4]);

impl IntentScores {
    /// Score for a category.
    pub fn get(&self, category: IntentCategory) -> f64 {
        self.0[category as usize]
    }

    /// Overwrite the score for a category.
    pub fn set(&mut self, category: IntentCategory, value: f64) {
        self.0[category as usize] = value;
    }

    /// Add to the score for a category.
    pub fn add(&mut self, category: IntentCategory, value: f64) {
        self.0[category as usize] += value;
    }

    /// Sum across all categories.
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Iterate (category, score) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (IntentCategory, f64)> + '_ {
        IntentCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Apply a function to every score, producing a new vector.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut out = *self;
        for slot in &mut out.0 {
            *slot = f(*slot);
        }
        out
    }

    /// Highest-scoring category. Ties resolve to the earliest declared
    /// category — a deterministic, testable contract.
    pub fn argmax(&self) -> IntentCategory {
        let mut best = IntentCategory::Urgent;
        let mut best_score = self.get(best);
        for category in IntentCategory::ALL {
            if self.get(category) > best_score {
                best = category;
                best_score = self.get(category);
            }
        }
        best
    }
}

impl Serialize for IntentScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(IntentCategory::ALL.len()))?;
        for (category, score) in self.iter() {
            map.serialize_entry(category.label(), &score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IntentScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = IntentScores;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of intent category label to score")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut scores = IntentScores::default();
                while let Some((label, value)) = access.next_entry::<String, f64>()? {
                    let category = IntentCategory::from_label(&label).ok_or_else(|| {
                        serde::de::Error::unknown_variant(&label, &IntentCategory::LABELS)
                    })?;
                    scores.set(category, value);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}

/// Round to a fixed number of decimal places — the stable external
/// contract for every score this crate returns.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ── Raw signal data ─────────────────────────────────────────────────

const URGENT_KEYWORDS: &[&str] = &[
    "urgent", "asap", "immediately", "emergency", "critical", "help", "crisis", "now", "hurry",
    "quick", "fast", "important", "priority", "deadline", "rush",
];

const URGENT_PATTERNS: &[&str] = &[
    r"\basap\b",
    r"\burgent\b",
    r"!!!+",
    r"\bhelp\b",
    r"need.*now",
    r"right away",
    r"as soon as possible",
];

const SUPPORT_KEYWORDS: &[&str] = &[
    "help", "issue", "problem", "error", "broken", "fix", "not working", "trouble", "stuck",
    "confused", "question", "how do i", "can't", "unable", "support", "assist",
];

const SUPPORT_PATTERNS: &[&str] = &[
    r"how (do|can|to) (i|we)",
    r"(doesn't|don't|can't) work",
    r"having (trouble|issues|problems)",
    r"\?$",
];

const SALES_KEYWORDS: &[&str] = &[
    "buy", "purchase", "price", "cost", "discount", "offer", "deal", "plan", "subscription",
    "upgrade", "premium", "quote", "pricing", "interested", "demo", "trial",
];

const SALES_PATTERNS: &[&str] = &[
    r"how much",
    r"what('s| is) the price",
    r"interested in",
    r"want to (buy|purchase)",
    r"looking for.*plan",
];

const CASUAL_KEYWORDS: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "good", "great", "nice", "cool", "okay",
    "ok", "sure", "yes", "no", "maybe",
];

const CASUAL_PATTERNS: &[&str] = &[
    r"^(hi|hey|hello)\b",
    r"^(thanks|thank you)",
    r"^(ok|okay|sure)\b",
    r"^(bye|goodbye)",
];

/// Urgency keywords with weights, in display (first-seen) order.
const URGENCY_KEYWORDS: &[(&str, f64)] = &[
    ("urgent", 3.0),
    ("asap", 3.0),
    ("emergency", 3.5),
    ("critical", 3.0),
    ("immediately", 2.5),
    ("help", 1.5),
    ("important", 2.0),
    ("deadline", 2.5),
    ("now", 1.5),
    ("today", 1.0),
    ("broken", 2.0),
    ("error", 1.5),
    ("failed", 2.0),
    ("down", 2.0),
    ("blocked", 2.0),
    ("waiting", 1.0),
    ("stuck", 1.5),
    ("please", 0.5),
];

const TIME_PATTERNS: &[&str] = &[
    r"\btoday\b",
    r"\bnow\b",
    r"\bimmediately\b",
    r"\bas soon as\b",
    r"\bby\s+\d",
    r"\bdeadline\b",
    r"\bdue\b",
];

const NEGATIVE_PATTERNS: &[&str] = &[
    r"\bcan'?t\b",
    r"\bwon'?t\b",
    r"\bdoesn'?t\b",
    r"\bnot working\b",
    r"\bfailed\b",
    r"\berror\b",
    r"\bbroken\b",
    r"\bissue\b",
    r"\bproblem\b",
];

/// Anchored question shapes, matched against lower-cased text.
const QUESTION_PATTERNS: &[&str] = &[
    r"^(what|how|why|when|where|who|which|can|could|would|should|is|are|do|does|did)\b.*\?$",
    r"^.*\?$",
    r"^(tell me|explain|describe|show me)\b.*",
    r"^i\s+(want|need|would like)\s+to\s+know\b.*",
];

const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "can you", "could you", "would you",
    "is there", "are there", "do you", "does it", "did you",
];

const ANSWER_INDICATORS: &[&str] = &[
    "you can",
    "you should",
    "to do this",
    "the answer is",
    "yes,",
    "no,",
    "sure,",
    "basically",
    "essentially",
    "it is",
    "it's",
    "they are",
    "this is",
];

const CAUSAL_CONNECTORS: &[&str] = &["because", "therefore", "so that", "in order to"];

// ── Tables ──────────────────────────────────────────────────────────

/// Keyword, pattern, and weight signals for one intent category.
#[derive(Debug, Clone)]
pub struct IntentSignals {
    /// Keywords matched by literal containment in lower-cased text.
    pub keywords: Vec<&'static str>,
    /// Compiled case-insensitive patterns.
    pub patterns: Vec<Regex>,
    /// Multiplier applied to the raw keyword+pattern score. Always > 0.
    pub weight: f64,
}

/// Immutable, process-wide signal configuration.
#[derive(Debug)]
pub struct SignalTables {
    intents: [IntentSignals; 4],
    urgency_keywords: Vec<(&'static str, f64)>,
    exclamation_run: Regex,
    time_patterns: Vec<Regex>,
    negative_patterns: Vec<Regex>,
    question_patterns: Vec<Regex>,
    question_starters: Vec<&'static str>,
    answer_indicators: Vec<&'static str>,
    causal_connectors: Vec<&'static str>,
}

impl SignalTables {
    /// Build the standard tables, compiling and validating every pattern.
    ///
    /// A malformed regex or non-positive weight is a fatal startup error.
    pub fn standard() -> Result<Self, ConfigError> {
        let intents = [
            build_intent("urgent", URGENT_KEYWORDS, URGENT_PATTERNS, 1.5)?,
            build_intent("support", SUPPORT_KEYWORDS, SUPPORT_PATTERNS, 1.0)?,
            build_intent("sales", SALES_KEYWORDS, SALES_PATTERNS, 1.2)?,
            build_intent("casual", CASUAL_KEYWORDS, CASUAL_PATTERNS, 0.5)?,
        ];

        Ok(Self {
            intents,
            urgency_keywords: URGENCY_KEYWORDS.to_vec(),
            exclamation_run: compile(r"!{2,}")?,
            time_patterns: compile_all(TIME_PATTERNS)?,
            negative_patterns: compile_all(NEGATIVE_PATTERNS)?,
            question_patterns: compile_all(QUESTION_PATTERNS)?,
            question_starters: QUESTION_STARTERS.to_vec(),
            answer_indicators: ANSWER_INDICATORS.to_vec(),
            causal_connectors: CAUSAL_CONNECTORS.to_vec(),
        })
    }

    /// Signals for one intent category.
    pub fn intent(&self, category: IntentCategory) -> &IntentSignals {
        &self.intents[category as usize]
    }

    /// Urgency keyword table in display order.
    pub fn urgency_keywords(&self) -> &[(&'static str, f64)] {
        &self.urgency_keywords
    }

    /// Fixed priority weight per intent category.
    pub fn priority_weight(&self, category: IntentCategory) -> f64 {
        match category {
            IntentCategory::Urgent => 3.0,
            IntentCategory::Support => 2.0,
            IntentCategory::Sales => 1.5,
            IntentCategory::Casual => 0.5,
        }
    }

    /// Two-or-more consecutive exclamation marks.
    pub fn exclamation_run(&self) -> &Regex {
        &self.exclamation_run
    }

    /// Time-sensitive patterns (each counted at most once per message).
    pub fn time_patterns(&self) -> &[Regex] {
        &self.time_patterns
    }

    /// Negative-sentiment patterns (each counted at most once per message).
    pub fn negative_patterns(&self) -> &[Regex] {
        &self.negative_patterns
    }

    /// Anchored question-shape patterns.
    pub fn question_patterns(&self) -> &[Regex] {
        &self.question_patterns
    }

    /// Phrases a question tends to start with.
    pub fn question_starters(&self) -> &[&'static str] {
        &self.question_starters
    }

    /// Phrases that mark a message as an answer.
    pub fn answer_indicators(&self) -> &[&'static str] {
        &self.answer_indicators
    }

    /// Connectors that mark an explanatory answer.
    pub fn causal_connectors(&self) -> &[&'static str] {
        &self.causal_connectors
    }
}

fn build_intent(
    label: &str,
    keywords: &[&'static str],
    patterns: &[&str],
    weight: f64,
) -> Result<IntentSignals, ConfigError> {
    if weight <= 0.0 {
        return Err(ConfigError::InvalidWeight {
            table: label.to_string(),
            weight,
        });
    }
    Ok(IntentSignals {
        keywords: keywords.to_vec(),
        patterns: compile_all(patterns)?,
        weight,
    })
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile(p)).collect()
}
