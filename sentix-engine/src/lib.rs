//! Sentix Engine - sentiment analysis orchestration.
//!
//! This crate provides:
//! - Output contracts (response schemas and typed parsing) per analysis kind
//! - Prompt construction
//! - A generative backend abstraction with a Gemini implementation
//! - A lexicon classifier used when the backend is unavailable
//! - Session quota enforcement
//! - The [`AnalysisOrchestrator`] tying these together

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod backend;
pub mod client;
pub mod contract;
pub mod error;
pub mod fallback;
pub mod history;
pub mod input;
pub mod orchestrator;
pub mod prompt;
pub mod quota;
pub mod types;

pub use backend::{GeminiBackend, GenerativeBackend, UnavailableBackend};
pub use client::StructuredClient;
pub use contract::ParsedPayload;
pub use error::{AnalysisError, BackendFailure, FailureKind, InputError, TextSubject};
pub use fallback::{extract_keywords, FallbackClassifier};
pub use history::AnalysisHistory;
pub use orchestrator::AnalysisOrchestrator;
pub use prompt::RequestDescriptor;
pub use quota::{Admission, QuotaGuard, QuotaPermit, QuotaState};
pub use types::{
    AdvancedAnalysis, AnalysisKind, AnalysisResult, ComparativeResult, EnhancedAnalysis,
    MoodEnhancement, Provenance, ScoreTriple, SentimentLabel,
};
