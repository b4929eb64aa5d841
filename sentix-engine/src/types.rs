//! Result types produced by the analysis layer.
//!
//! Every analysis, whether it came from the remote backend or the local
//! fallback, is expressed with these types. They serialize in camelCase so
//! downstream renderers and exporters can consume them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Overall sentiment of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// All labels, in contract order.
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!(
                "unknown sentiment '{}', expected positive, negative or neutral",
                other
            )),
        }
    }
}

/// Per-label probability-like scores, each in [0, 1].
///
/// Backend scores are kept as reported (after clamping) and need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl ScoreTriple {
    /// Give `winner` the confidence and split the remainder evenly.
    pub fn dominant(winner: SentimentLabel, confidence: f64) -> Self {
        let rest = (1.0 - confidence) / 2.0;
        let mut scores = Self {
            positive: rest,
            negative: rest,
            neutral: rest,
        };
        *scores.get_mut(winner) = confidence;
        scores
    }

    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    fn get_mut(&mut self, label: SentimentLabel) -> &mut f64 {
        match label {
            SentimentLabel::Positive => &mut self.positive,
            SentimentLabel::Negative => &mut self.negative,
            SentimentLabel::Neutral => &mut self.neutral,
        }
    }

    pub fn sum(&self) -> f64 {
        self.positive + self.negative + self.neutral
    }

    /// Clamp every entry into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            positive: clamp_unit(self.positive),
            negative: clamp_unit(self.negative),
            neutral: clamp_unit(self.neutral),
        }
    }
}

/// Clamp a score-like value into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Sentiment of a single sentence inside a larger text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceScore {
    pub sentence: String,
    pub label: SentimentLabel,
    pub score: f64,
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Remote generative backend
    Backend,
    /// Local lexicon classifier
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => f.write_str("backend"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// A completed sentiment analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub source_text: String,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub scores: ScoreTriple,
    /// Up to five keywords, most relevant first
    pub keywords: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub sentence_breakdown: Vec<SentenceScore>,
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
}

/// Named emotion with intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub name: String,
    pub score: f64,
}

/// Entity categories recognised by the advanced analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Event,
    Other,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        Self::Person,
        Self::Organization,
        Self::Location,
        Self::Event,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::Location => "LOCATION",
            Self::Event => "EVENT",
            Self::Other => "OTHER",
        }
    }
}

/// Named entity mentioned in a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

/// Emotion, tone and entity breakdown of a text ("deeper analysis").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedAnalysis {
    pub emotions: Vec<Emotion>,
    pub tones: Vec<String>,
    pub entities: Vec<Entity>,
    pub summary: String,
}

/// A value for each side of a two-text comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct TextPair<T> {
    pub a: T,
    pub b: T,
}

/// Sentiment summary of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSentiment {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub scores: ScoreTriple,
}

/// Result of comparing two texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeResult {
    pub summary: String,
    pub per_text: TextPair<TextSentiment>,
    pub shared_keywords: BTreeSet<String>,
    pub unique_keywords: TextPair<Vec<String>>,
    pub emotional_contrast: String,
}

/// Suggested listening for a mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub url: String,
}

/// Quote and playlist suggestion matched to a sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEnhancement {
    pub quote: String,
    pub playlist: Playlist,
}

impl MoodEnhancement {
    /// Fixed suggestion used when the backend cannot produce one.
    pub fn default_for(label: SentimentLabel) -> Self {
        let (quote, name, query) = match label {
            SentimentLabel::Positive => (
                "Happiness is not something ready made. It comes from your own actions.",
                "Feel-Good Favorites",
                "feel%20good",
            ),
            SentimentLabel::Negative => (
                "Every storm runs out of rain.",
                "Gentle Pick-Me-Ups",
                "mood%20booster",
            ),
            SentimentLabel::Neutral => (
                "Wherever you are, be all there.",
                "Calm Focus",
                "calm%20focus",
            ),
        };

        Self {
            quote: quote.to_string(),
            playlist: Playlist {
                name: name.to_string(),
                url: format!("https://open.spotify.com/search/{}", query),
            },
        }
    }
}

/// A single-text analysis together with its optional mood suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAnalysis {
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodEnhancement>,
}

/// The analysis kinds the backend is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Sentiment,
    Advanced,
    Mood,
    Comparative,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sentiment => "sentiment",
            Self::Advanced => "advanced",
            Self::Mood => "mood",
            Self::Comparative => "comparative",
        };
        f.write_str(s)
    }
}
