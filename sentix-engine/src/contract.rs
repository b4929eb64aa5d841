//! Output contract for every analysis kind.
//!
//! The same contract is used twice: as the response schema attached to a
//! backend request, and as the typed parse step applied to what comes back.
//! Anything that does not fit (missing field, unknown enum value, wrong
//! type, too many items) is rejected. The only repair applied is clamping
//! score-like numbers into [0, 1].

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::types::{
    clamp_unit, AdvancedAnalysis, AnalysisKind, ComparativeResult, EntityType, MoodEnhancement,
    ScoreTriple, SentenceScore, SentimentLabel, TextPair, TextSentiment,
};

/// Maximum keywords in a sentiment result.
pub const MAX_KEYWORDS: usize = 5;
/// Emotions in an advanced analysis: the top 3 to 5.
pub const MIN_EMOTIONS: usize = 3;
pub const MAX_EMOTIONS: usize = 5;
/// Tones in an advanced analysis: 2 to 4.
pub const MIN_TONES: usize = 2;
pub const MAX_TONES: usize = 4;

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Not a JSON document at all
    Malformed(String),
    /// Valid JSON with the wrong shape or values
    Violation(String),
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(m) => write!(f, "malformed JSON: {}", m),
            Self::Violation(m) => write!(f, "contract violation: {}", m),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => Self::Violation(e.to_string()),
            Category::Syntax | Category::Eof | Category::Io => Self::Malformed(e.to_string()),
        }
    }
}

// ============================================================================
// Wire payloads
// ============================================================================

/// Sentiment payload as emitted by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentPayload {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub scores: ScoreTriple,
    pub keywords: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub sentences: Vec<SentencePayload>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentencePayload {
    pub text: String,
    pub sentiment: SentimentLabel,
    pub score: f64,
}

impl SentimentPayload {
    pub fn sentence_breakdown(&self) -> Vec<SentenceScore> {
        self.sentences
            .iter()
            .map(|s| SentenceScore {
                sentence: s.text.clone(),
                label: s.sentiment,
                score: s.score,
            })
            .collect()
    }
}

/// Comparison payload as emitted by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparativePayload {
    summary: String,
    text_a: TextSentiment,
    text_b: TextSentiment,
    shared_keywords: Vec<String>,
    unique_keywords_a: Vec<String>,
    unique_keywords_b: Vec<String>,
    emotional_contrast: String,
}

impl From<ComparativePayload> for ComparativeResult {
    fn from(p: ComparativePayload) -> Self {
        Self {
            summary: p.summary,
            per_text: TextPair {
                a: p.text_a,
                b: p.text_b,
            },
            shared_keywords: p.shared_keywords.into_iter().collect::<BTreeSet<_>>(),
            unique_keywords: TextPair {
                a: p.unique_keywords_a,
                b: p.unique_keywords_b,
            },
            emotional_contrast: p.emotional_contrast,
        }
    }
}

/// A contract-checked backend payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Sentiment(SentimentPayload),
    Advanced(AdvancedAnalysis),
    Mood(MoodEnhancement),
    Comparative(ComparativeResult),
}

impl ParsedPayload {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::Sentiment(_) => AnalysisKind::Sentiment,
            Self::Advanced(_) => AnalysisKind::Advanced,
            Self::Mood(_) => AnalysisKind::Mood,
            Self::Comparative(_) => AnalysisKind::Comparative,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse and check a JSON document against the contract for `kind`.
pub fn parse(kind: AnalysisKind, json: &str) -> Result<ParsedPayload, ContractError> {
    match kind {
        AnalysisKind::Sentiment => {
            let mut p: SentimentPayload = serde_json::from_str(json)?;
            check_max("keywords", p.keywords.len(), MAX_KEYWORDS)?;
            p.confidence = clamp_unit(p.confidence);
            p.scores = p.scores.clamped();
            for s in &mut p.sentences {
                s.score = clamp_unit(s.score);
            }
            Ok(ParsedPayload::Sentiment(p))
        }
        AnalysisKind::Advanced => {
            let mut p: AdvancedAnalysis = serde_json::from_str(json)?;
            check_range("emotions", p.emotions.len(), MIN_EMOTIONS, MAX_EMOTIONS)?;
            check_range("tones", p.tones.len(), MIN_TONES, MAX_TONES)?;
            for e in &mut p.emotions {
                e.score = clamp_unit(e.score);
            }
            Ok(ParsedPayload::Advanced(p))
        }
        AnalysisKind::Mood => {
            let p: MoodEnhancement = serde_json::from_str(json)?;
            if p.quote.trim().is_empty() {
                return Err(ContractError::Violation("quote is empty".into()));
            }
            Ok(ParsedPayload::Mood(p))
        }
        AnalysisKind::Comparative => {
            let mut p: ComparativePayload = serde_json::from_str(json)?;
            for side in [&mut p.text_a, &mut p.text_b] {
                side.confidence = clamp_unit(side.confidence);
                side.scores = side.scores.clamped();
            }
            Ok(ParsedPayload::Comparative(p.into()))
        }
    }
}

fn check_max(field: &str, len: usize, max: usize) -> Result<(), ContractError> {
    if len > max {
        return Err(ContractError::Violation(format!(
            "{} has {} items, at most {} allowed",
            field, len, max
        )));
    }
    Ok(())
}

fn check_range(field: &str, len: usize, min: usize, max: usize) -> Result<(), ContractError> {
    if len < min {
        return Err(ContractError::Violation(format!(
            "{} has {} items, at least {} required",
            field, len, min
        )));
    }
    check_max(field, len, max)
}

// ============================================================================
// Response schemas
// ============================================================================

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn number() -> Value {
    json!({ "type": "NUMBER" })
}

fn enum_of(values: &[&str]) -> Value {
    json!({ "type": "STRING", "enum": values })
}

fn array(items: Value, min: Option<usize>, max: Option<usize>) -> Value {
    let mut schema = json!({ "type": "ARRAY", "items": items });
    if let Some(min) = min {
        schema["minItems"] = json!(min);
    }
    if let Some(max) = max {
        schema["maxItems"] = json!(max);
    }
    schema
}

fn object(properties: &[(&str, Value)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    json!({ "type": "OBJECT", "properties": props, "required": required })
}

fn label() -> Value {
    let labels: Vec<&str> = SentimentLabel::ALL.iter().map(|l| l.as_str()).collect();
    enum_of(&labels)
}

fn score_triple() -> Value {
    object(
        &[
            ("positive", number()),
            ("negative", number()),
            ("neutral", number()),
        ],
        &["positive", "negative", "neutral"],
    )
}

fn text_sentiment() -> Value {
    object(
        &[
            ("label", label()),
            ("confidence", number()),
            ("scores", score_triple()),
        ],
        &["label", "confidence", "scores"],
    )
}

/// Response schema for `kind`, in the generative backend's schema dialect.
pub fn schema(kind: AnalysisKind) -> Value {
    match kind {
        AnalysisKind::Sentiment => object(
            &[
                ("sentiment", label()),
                ("confidence", number()),
                ("scores", score_triple()),
                ("keywords", array(string(), None, Some(MAX_KEYWORDS))),
                ("explanation", string()),
                (
                    "sentences",
                    array(
                        object(
                            &[("text", string()), ("sentiment", label()), ("score", number())],
                            &["text", "sentiment", "score"],
                        ),
                        None,
                        None,
                    ),
                ),
            ],
            &["sentiment", "confidence", "scores", "keywords", "explanation"],
        ),
        AnalysisKind::Advanced => {
            let types: Vec<&str> = EntityType::ALL.iter().map(|t| t.as_str()).collect();
            object(
                &[
                    (
                        "emotions",
                        array(
                            object(&[("name", string()), ("score", number())], &["name", "score"]),
                            Some(MIN_EMOTIONS),
                            Some(MAX_EMOTIONS),
                        ),
                    ),
                    ("tones", array(string(), Some(MIN_TONES), Some(MAX_TONES))),
                    (
                        "entities",
                        array(
                            object(&[("text", string()), ("type", enum_of(&types))], &["text", "type"]),
                            None,
                            None,
                        ),
                    ),
                    ("summary", string()),
                ],
                &["emotions", "tones", "entities", "summary"],
            )
        }
        AnalysisKind::Mood => object(
            &[
                ("quote", string()),
                (
                    "playlist",
                    object(&[("name", string()), ("url", string())], &["name", "url"]),
                ),
            ],
            &["quote", "playlist"],
        ),
        AnalysisKind::Comparative => object(
            &[
                ("summary", string()),
                ("textA", text_sentiment()),
                ("textB", text_sentiment()),
                ("sharedKeywords", array(string(), None, None)),
                ("uniqueKeywordsA", array(string(), None, None)),
                ("uniqueKeywordsB", array(string(), None, None)),
                ("emotionalContrast", string()),
            ],
            &[
                "summary",
                "textA",
                "textB",
                "sharedKeywords",
                "uniqueKeywordsA",
                "uniqueKeywordsB",
                "emotionalContrast",
            ],
        ),
    }
}
