//! Prompt construction for each analysis kind.
//!
//! Builders are pure: the same input always yields the same
//! [`RequestDescriptor`]. User text is placed inside a double-quoted
//! envelope, so backslashes and double quotes are escaped first.

use serde_json::Value;

use crate::contract;
use crate::types::{AnalysisKind, SentimentLabel};

/// Characters of input text used as mood context.
pub const MOOD_CONTEXT_CHARS: usize = 500;

/// Backend-agnostic description of one structured request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub kind: AnalysisKind,
    pub prompt: String,
    pub schema: Value,
}

impl RequestDescriptor {
    fn new(kind: AnalysisKind, prompt: String) -> Self {
        Self {
            kind,
            prompt,
            schema: contract::schema(kind),
        }
    }
}

/// Escape text for a double-quoted prompt envelope.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

/// Overall sentiment, keywords and per-sentence breakdown.
pub fn sentiment(text: &str) -> RequestDescriptor {
    let prompt = format!(
        "Analyze the sentiment of the following text.\n\
         Classify it as positive, negative or neutral and give a confidence between 0 and 1.\n\
         Provide scores between 0 and 1 for positive, negative and neutral.\n\
         List up to 5 keywords that drive the sentiment, most relevant first.\n\
         Explain the classification in one or two sentences.\n\
         Break the text into sentences and classify each one.\n\n\
         Text: {}",
        quoted(text)
    );
    RequestDescriptor::new(AnalysisKind::Sentiment, prompt)
}

/// Emotions, tones, entities and a short summary.
pub fn advanced(text: &str) -> RequestDescriptor {
    let prompt = format!(
        "Perform a deeper analysis of the following text.\n\
         Identify the top 3 to 5 emotions with an intensity between 0 and 1.\n\
         Identify 2 to 4 tones of voice.\n\
         Extract named entities and type each as PERSON, ORGANIZATION, LOCATION, EVENT or OTHER.\n\
         Summarize the text in one sentence.\n\n\
         Text: {}",
        quoted(text)
    );
    RequestDescriptor::new(AnalysisKind::Advanced, prompt)
}

/// A quote and playlist suited to the detected mood.
///
/// Only the first [`MOOD_CONTEXT_CHARS`] characters of `text` are sent.
pub fn mood(label: SentimentLabel, text: &str) -> RequestDescriptor {
    let context: String = text.chars().take(MOOD_CONTEXT_CHARS).collect();
    let prompt = format!(
        "Someone wrote a text with {} sentiment.\n\
         Suggest one short inspirational quote that fits their mood,\n\
         and one music playlist with a name and a public URL.\n\n\
         Context: {}",
        label,
        quoted(&context)
    );
    RequestDescriptor::new(AnalysisKind::Mood, prompt)
}

/// Side-by-side comparison of two texts.
pub fn comparative(a: &str, b: &str) -> RequestDescriptor {
    let prompt = format!(
        "Compare the sentiment of the two texts below.\n\
         For each text give a label (positive, negative or neutral), a confidence and scores.\n\
         List keywords the texts share and keywords unique to each.\n\
         Describe the emotional contrast between them and summarize the comparison.\n\n\
         Text A: {}\n\
         Text B: {}",
        quoted(a),
        quoted(b)
    );
    RequestDescriptor::new(AnalysisKind::Comparative, prompt)
}
