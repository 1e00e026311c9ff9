//! Pattern Matcher — weighted lexical scan over curated crisis phrase tables.
//!
//! Four phrase categories, each with a fixed weight:
//!
//!  1. **Direct threat** (10) — explicit statements of intent; immediacy of
//!     intent is the strongest single lexical signal
//!  2. **Method reference** (8) — concreteness of plan outweighs mood language
//!  3. **Temporal imminence** (7) — a named time or an in-hand plan
//!  4. **Indirect ideation** (6) — hopelessness and burden language
//!
//! Matching is lowercase substring scan, accumulating additively with no cap:
//! a text matching many phrases should score higher. Overlapping phrases can
//! both fire; hits are not deduplicated. Pure function of the text and the
//! static catalog.

const DIRECT_WEIGHT: f64 = 10.0;
const METHOD_WEIGHT: f64 = 8.0;
const TEMPORAL_WEIGHT: f64 = 7.0;
const INDIRECT_WEIGHT: f64 = 6.0;

// ── Phrase tables (lowercase literals, loaded once, shared read-only) ───────

const DIRECT_PATTERNS: &[&str] = &[
    "i want to kill myself",
    "i am going to kill myself",
    "i plan to end my life",
    "i am going to commit suicide",
    "i have decided to die",
    "i will take my own life",
    "tonight is my last night",
    "i already have the",
    "i know how i will do it",
];

const INDIRECT_PATTERNS: &[&str] = &[
    "i can't go on anymore",
    "there's no point in living",
    "everyone would be better without me",
    "i feel like giving up",
    "life is too hard",
    "i don't see a way out",
    "i feel trapped",
    "nothing will ever get better",
    "i am a burden to everyone",
    "i just want the pain to stop",
    "hopeless",
    "worthless",
    "empty",
    "numb",
];

const METHOD_PATTERNS: &[&str] = &[
    "pills",
    "rope",
    "bridge",
    "gun",
    "knife",
    "overdose",
    "hanging",
    "jumping",
    "drowning",
    "cutting",
    "poison",
];

const TEMPORAL_PATTERNS: &[&str] = &[
    "tonight is my last",
    "today i will end",
    "tomorrow i plan to",
    "this weekend i will",
    "when i get home tonight",
    "after this conversation",
    "in the morning i will end",
    "by tonight",
    "before tomorrow",
    "very soon i will",
    "i have a plan",
];

/// Result of a lexical scan: the accumulated score and one labeled factor
/// string per hit, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct PatternReport {
    pub score: f64,
    pub factors: Vec<String>,
}

/// Scan `text` against the catalog. Pure; no side effects.
pub fn match_patterns(text: &str) -> PatternReport {
    let lower = text.to_lowercase();
    let mut report = PatternReport::default();

    scan(&lower, DIRECT_PATTERNS, DIRECT_WEIGHT, "Direct threat", &mut report);
    scan(&lower, INDIRECT_PATTERNS, INDIRECT_WEIGHT, "Indirect indicator", &mut report);
    scan(&lower, METHOD_PATTERNS, METHOD_WEIGHT, "Method reference", &mut report);
    scan(&lower, TEMPORAL_PATTERNS, TEMPORAL_WEIGHT, "Temporal indicator", &mut report);

    report
}

fn scan(lower: &str, patterns: &[&str], weight: f64, label: &str, report: &mut PatternReport) {
    for pattern in patterns {
        if lower.contains(pattern) {
            report.score += weight;
            report.factors.push(format!("{}: {}", label, pattern));
        }
    }
}
