//! Local lexicon classifier used when the backend is unavailable.
//!
//! Counts positive and negative lexicon words contained in the text and
//! derives a label, a confidence and a score triple that sums to one. It
//! never fails and has no side effects.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::contract::MAX_KEYWORDS;
use crate::types::{AnalysisResult, Provenance, ScoreTriple, SentimentLabel};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "love", "happy", "joy",
    "awesome", "best", "beautiful", "brilliant", "delight", "glad", "perfect", "pleased", "enjoy",
    "excited", "nice",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "hate", "sad", "angry", "worst", "poor", "disappoint",
    "upset", "annoy", "disgust", "fail", "hurt", "miserable", "pain", "ugly", "wrong", "boring",
];

const BASE_CONFIDENCE: f64 = 0.70;
const PER_HIT: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;
const NEUTRAL_CONFIDENCE: f64 = 0.75;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
        "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now", "old", "see",
        "two", "who", "did", "get", "let", "she", "too", "use", "this", "that", "with", "have",
        "from", "they", "will", "would", "there", "their", "what", "about", "which", "when",
        "make", "like", "time", "just", "know", "take", "into", "your", "some", "could", "them",
        "than", "then", "been", "were", "also", "very", "much", "more", "most", "here", "only",
        "over", "such", "being", "these", "those", "does", "each", "because", "while",
    ]
    .into_iter()
    .collect()
});

/// Most frequent content words of `text`, up to five.
///
/// Lower-cases, splits on non-word characters and drops short tokens and
/// stop words. Ties keep first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() <= 2 || STOP_WORDS.contains(token) {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Lexicon hit counts for a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconHits {
    pub positive: usize,
    pub negative: usize,
}

impl LexiconHits {
    pub fn count(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let hits = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count();
        Self {
            positive: hits(POSITIVE_WORDS),
            negative: hits(NEGATIVE_WORDS),
        }
    }

    pub fn label(&self) -> SentimentLabel {
        use std::cmp::Ordering::*;
        match self.positive.cmp(&self.negative) {
            Greater => SentimentLabel::Positive,
            Less => SentimentLabel::Negative,
            Equal => SentimentLabel::Neutral,
        }
    }

    pub fn confidence(&self) -> f64 {
        let winning = match self.label() {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => return NEUTRAL_CONFIDENCE,
        };
        (BASE_CONFIDENCE + PER_HIT * winning as f64).min(MAX_CONFIDENCE)
    }
}

/// Deterministic lexicon-based sentiment classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackClassifier;

impl FallbackClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> AnalysisResult {
        let hits = LexiconHits::count(text);
        let label = hits.label();
        let confidence = hits.confidence();

        AnalysisResult {
            source_text: text.to_string(),
            label,
            confidence,
            scores: ScoreTriple::dominant(label, confidence),
            keywords: extract_keywords(text),
            explanation: format!(
                "Offline keyword analysis classified this text as {} ({} positive and {} negative indicator words found).",
                label, hits.positive, hits.negative
            ),
            sentence_breakdown: Vec::new(),
            timestamp: Utc::now(),
            provenance: Provenance::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_positive_hit() {
        let result = FallbackClassifier::new().classify("I love this!");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(approx(result.confidence, 0.75));
        assert!(approx(result.scores.negative, 0.125));
        assert_eq!(result.provenance, Provenance::Fallback);
        assert!(result.sentence_breakdown.is_empty());
    }

    #[test]
    fn negative_hits_win() {
        let hits = LexiconHits::count("bad and sad and a little good");
        assert_eq!(hits, LexiconHits { positive: 1, negative: 2 });
        assert_eq!(hits.label(), SentimentLabel::Negative);
        assert!(approx(hits.confidence(), 0.80));
    }

    #[test]
    fn ties_are_neutral() {
        let hits = LexiconHits::count("the weather today");
        assert_eq!(hits.label(), SentimentLabel::Neutral);
        assert!(approx(hits.confidence(), NEUTRAL_CONFIDENCE));

        let hits = LexiconHits::count("good but bad");
        assert_eq!(hits.label(), SentimentLabel::Neutral);
    }

    #[test]
    fn confidence_is_capped() {
        let text = "good great excellent amazing wonderful fantastic love";
        assert!(approx(LexiconHits::count(text).confidence(), MAX_CONFIDENCE));
    }

    #[test]
    fn lexicon_matches_substrings() {
        let hits = LexiconHits::count("Lovely, unhappy, DISAPPOINTING");
        assert_eq!(hits.positive, 2);
        assert_eq!(hits.negative, 1);
    }

    #[test]
    fn keywords_by_frequency_then_first_seen() {
        let kw = extract_keywords("Rain, rain and more RAIN; clouds over hills, hills and wind!");
        assert_eq!(kw, vec!["rain", "hills", "clouds", "wind"]);
    }

    #[test]
    fn keywords_capped_at_five() {
        let kw = extract_keywords("alpha bravo charlie delta echo foxtrot golf");
        assert_eq!(kw, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
    }

    #[test]
    fn keywords_drop_short_and_stop_words() {
        assert!(extract_keywords("it is an ok day for the cat").iter().all(|k| k.len() > 2));
        assert_eq!(extract_keywords("it is an ok day for the cat"), vec!["day", "cat"]);
    }

    proptest! {
        #[test]
        fn scores_always_sum_to_one(text in ".{0,200}") {
            let result = FallbackClassifier::new().classify(&text);
            prop_assert!(approx(result.scores.sum(), 1.0));
            prop_assert!(result.confidence >= 0.70 && result.confidence <= MAX_CONFIDENCE);
            prop_assert!(result.keywords.len() <= MAX_KEYWORDS);
        }

        #[test]
        fn classification_is_pure(text in "[a-zA-Z !,]{1,120}") {
            let classifier = FallbackClassifier::new();
            let first = classifier.classify(&text);
            let second = classifier.classify(&text);
            prop_assert_eq!(first.label, second.label);
            prop_assert_eq!(first.scores, second.scores);
            prop_assert_eq!(first.keywords, second.keywords);
        }
    }
}
