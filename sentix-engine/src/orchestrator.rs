//! Request orchestration.
//!
//! Every request moves through
//! `validating → admitting → executing → [degrading] → completed`, or stops
//! early as `rejected` (bad input, quota) or `failed` (no local substitute
//! for the backend). Each transition is a structured event inside an
//! `analysis` span.

use std::sync::Arc;

use chrono::Utc;
use sentix_common::{Config, MAX_BATCH_ITEMS};
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

use crate::backend::GenerativeBackend;
use crate::client::StructuredClient;
use crate::contract::{ParsedPayload, SentimentPayload};
use crate::error::{AnalysisError, BackendFailure, InputError, TextSubject};
use crate::fallback::FallbackClassifier;
use crate::input::{validate_batch, validate_pair, validate_text};
use crate::prompt;
use crate::quota::{Admission, QuotaGuard, QuotaPermit, QuotaState};
use crate::types::{
    AdvancedAnalysis, AnalysisKind, AnalysisResult, ComparativeResult, EnhancedAnalysis,
    MoodEnhancement, Provenance, SentimentLabel,
};

/// Default cap on texts per batch.
pub const DEFAULT_MAX_BATCH: usize = 10;

/// Entry point for all analysis operations.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    client: StructuredClient,
    fallback: FallbackClassifier,
    quota: Arc<QuotaGuard>,
    max_batch: usize,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, quota: Arc<QuotaGuard>) -> Self {
        Self {
            client: StructuredClient::new(backend),
            fallback: FallbackClassifier::new(),
            quota,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }

    /// Build with the quota limit and batch cap from `config`.
    pub fn from_config(config: &Config, backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::new(backend, QuotaGuard::new(config.quota.limit)).with_max_batch(config.batch.max_items)
    }

    /// Batch cap, clamped to `1..=MAX_BATCH_ITEMS`.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.clamp(1, MAX_BATCH_ITEMS);
        self
    }

    pub fn quota(&self) -> &Arc<QuotaGuard> {
        &self.quota
    }

    pub fn quota_state(&self) -> QuotaState {
        self.quota.state()
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    // ========================================================================
    // Single text
    // ========================================================================

    /// Analyze one text, degrading to the local classifier on backend failure.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let span = sentix_common::analysis_span!("analyze");
        async move {
            checked(validate_text(text, TextSubject::Single))?;
            let permit = self.admit(1)?;

            debug!(state = "executing", "Requesting sentiment");
            let result = Self::run_single(&self.client, self.fallback, text).await;
            permit.commit(1);

            info!(
                state = "completed",
                label = %result.label,
                provenance = %result.provenance,
                "Analysis complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Analyze one text and attach a best-effort mood suggestion.
    ///
    /// The suggestion is omitted when the backend cannot produce one.
    pub async fn analyze_with_mood(&self, text: &str) -> Result<EnhancedAnalysis, AnalysisError> {
        let result = self.analyze(text).await?;
        let mood = self.try_mood(result.label, text).await.ok();
        Ok(EnhancedAnalysis { result, mood })
    }

    async fn run_single(
        client: &StructuredClient,
        fallback: FallbackClassifier,
        text: &str,
    ) -> AnalysisResult {
        let outcome = match client.invoke(&prompt::sentiment(text)).await {
            Ok(ParsedPayload::Sentiment(payload)) => Ok(payload),
            Ok(other) => Err(mismatch(client, AnalysisKind::Sentiment, &other)),
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(payload) => from_payload(text, payload),
            Err(failure) => {
                warn!(
                    state = "degrading",
                    error = %failure,
                    kind = %failure.kind,
                    "Backend analysis failed, falling back to lexicon classifier"
                );
                fallback.classify(text)
            }
        }
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Analyze up to the batch cap concurrently; extra texts are ignored.
    ///
    /// Results come back in input order. An item whose task dies is left
    /// out and not charged.
    pub async fn analyze_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let span = sentix_common::analysis_span!("analyze_batch", submitted = texts.len());
        async move {
            let texts = if texts.len() > self.max_batch {
                warn!(
                    submitted = texts.len(),
                    max = self.max_batch,
                    "Batch exceeds cap, extra texts ignored"
                );
                &texts[..self.max_batch]
            } else {
                texts
            };

            checked(validate_batch(texts))?;
            let permit = self.admit(units(texts.len()))?;

            debug!(state = "executing", items = texts.len(), "Dispatching batch");
            let mut join_set: JoinSet<(usize, AnalysisResult)> = JoinSet::new();
            for (index, text) in texts.iter().enumerate() {
                let client = self.client.clone();
                let fallback = self.fallback;
                let text = text.as_ref().to_string();
                join_set.spawn(
                    async move {
                        let result = Self::run_single(&client, fallback, &text).await;
                        (index, result)
                    }
                    .in_current_span(),
                );
            }

            let mut results = Vec::with_capacity(texts.len());
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(item) => results.push(item),
                    Err(e) => warn!(error = %e, "Batch item task failed, excluding it"),
                }
            }
            results.sort_by_key(|(index, _)| *index);
            let results: Vec<AnalysisResult> = results.into_iter().map(|(_, r)| r).collect();

            permit.commit(units(results.len()));
            info!(
                state = "completed",
                completed = results.len(),
                requested = texts.len(),
                "Batch complete"
            );
            Ok(results)
        }
        .instrument(span)
        .await
    }

    // ========================================================================
    // Backend-only operations
    // ========================================================================

    /// Compare two texts. Charged one unit, only on success.
    pub async fn compare(&self, a: &str, b: &str) -> Result<ComparativeResult, AnalysisError> {
        let span = sentix_common::analysis_span!("compare");
        async move {
            checked(validate_pair(a, b))?;
            let permit = self.admit(1)?;

            debug!(state = "executing", "Requesting comparison");
            let outcome = match self.client.invoke(&prompt::comparative(a, b)).await {
                Ok(ParsedPayload::Comparative(result)) => Ok(result),
                Ok(other) => Err(mismatch(&self.client, AnalysisKind::Comparative, &other)),
                Err(failure) => Err(failure),
            };

            match outcome {
                Ok(result) => {
                    permit.commit(1);
                    info!(state = "completed", "Comparison complete");
                    Ok(result)
                }
                Err(failure) => Err(unsupported("Comparison", failure)),
            }
        }
        .instrument(span)
        .await
    }

    /// Emotions, tones and entities of a text. Not quota-metered.
    pub async fn deeper_analysis(&self, text: &str) -> Result<AdvancedAnalysis, AnalysisError> {
        let span = sentix_common::analysis_span!("deeper_analysis");
        async move {
            checked(validate_text(text, TextSubject::Single))?;

            debug!(state = "executing", "Requesting deeper analysis");
            match self.client.invoke(&prompt::advanced(text)).await {
                Ok(ParsedPayload::Advanced(analysis)) => {
                    info!(state = "completed", "Deeper analysis complete");
                    Ok(analysis)
                }
                Ok(other) => Err(unsupported(
                    "Deeper analysis",
                    mismatch(&self.client, AnalysisKind::Advanced, &other),
                )),
                Err(failure) => Err(unsupported("Deeper analysis", failure)),
            }
        }
        .instrument(span)
        .await
    }

    /// Quote and playlist for a mood. Falls back to a fixed suggestion.
    pub async fn mood_enhancement(&self, label: SentimentLabel, text: &str) -> MoodEnhancement {
        let span = sentix_common::analysis_span!("mood_enhancement", label = %label);
        async move {
            match self.try_mood(label, text).await {
                Ok(mood) => mood,
                Err(failure) => {
                    warn!(
                        state = "degrading",
                        error = %failure,
                        "Mood suggestion failed, using default"
                    );
                    MoodEnhancement::default_for(label)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_mood(
        &self,
        label: SentimentLabel,
        text: &str,
    ) -> Result<MoodEnhancement, BackendFailure> {
        match self.client.invoke(&prompt::mood(label, text)).await {
            Ok(ParsedPayload::Mood(mood)) => Ok(mood),
            Ok(other) => Err(mismatch(&self.client, AnalysisKind::Mood, &other)),
            Err(failure) => {
                debug!(error = %failure, "Mood suggestion unavailable");
                Err(failure)
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn admit(&self, units: u32) -> Result<QuotaPermit, AnalysisError> {
        debug!(state = "admitting", units, "Checking quota");
        match self.quota.admit(units) {
            Admission::Admitted(permit) => Ok(permit),
            Admission::Rejected { remaining } => {
                info!(state = "rejected", requested = units, remaining, "Quota exceeded");
                Err(AnalysisError::QuotaExceeded {
                    requested: units,
                    remaining,
                })
            }
        }
    }
}

/// Quota units for `n` items.
fn units(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn checked(validation: Result<(), InputError>) -> Result<(), AnalysisError> {
    debug!(state = "validating", "Validating input");
    validation.map_err(|e| {
        info!(state = "rejected", error = %e, "Input rejected");
        AnalysisError::Validation(e)
    })
}

fn unsupported(operation: &'static str, failure: BackendFailure) -> AnalysisError {
    warn!(state = "failed", operation, error = %failure, "Operation has no fallback");
    AnalysisError::UnsupportedOperation {
        operation,
        source: failure,
    }
}

fn mismatch(client: &StructuredClient, wanted: AnalysisKind, got: &ParsedPayload) -> BackendFailure {
    BackendFailure::contract(
        client.backend_name(),
        format!("expected {} payload, got {}", wanted, got.kind()),
    )
}

fn from_payload(text: &str, payload: SentimentPayload) -> AnalysisResult {
    let sentence_breakdown = payload.sentence_breakdown();
    AnalysisResult {
        source_text: text.to_string(),
        label: payload.sentiment,
        confidence: payload.confidence,
        scores: payload.scores,
        keywords: payload.keywords,
        explanation: payload.explanation,
        sentence_breakdown,
        timestamp: Utc::now(),
        provenance: Provenance::Backend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UnavailableBackend;
    use crate::error::FailureKind;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const POSITIVE: &str = r#"{"sentiment": "positive", "confidence": 0.9,
        "scores": {"positive": 0.9, "negative": 0.05, "neutral": 0.05},
        "keywords": ["sun"], "explanation": "Bright.",
        "sentences": [{"text": "sunny", "sentiment": "positive", "score": 0.9}]}"#;

    struct CountingBackend {
        reply: Result<String, BackendFailure>,
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new(reply: Result<&str, FailureKind>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply
                    .map(str::to_string)
                    .map_err(|kind| BackendFailure::new("mock", kind, "down")),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerativeBackend for CountingBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    /// Answers mood prompts with a suggestion and everything else with `POSITIVE`.
    struct RoutedBackend {
        calls: AtomicUsize,
    }

    impl RoutedBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerativeBackend for RoutedBackend {
        fn name(&self) -> &str {
            "routed"
        }

        async fn generate(&self, prompt: &str, _schema: &Value) -> Result<String, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("inspirational quote") {
                Ok(r#"{"quote": "Keep going.", "playlist": {"name": "Sunny", "url": "https://example.com/p"}}"#
                    .to_string())
            } else {
                Ok(POSITIVE.to_string())
            }
        }
    }

    #[tokio::test]
    async fn backend_result_keeps_breakdown() {
        let orchestrator = AnalysisOrchestrator::new(CountingBackend::new(Ok(POSITIVE)), QuotaGuard::new(15));
        let result = orchestrator.analyze("sunny day").await.unwrap();
        assert_eq!(result.provenance, Provenance::Backend);
        assert_eq!(result.sentence_breakdown.len(), 1);
        assert_eq!(orchestrator.quota_state().used, 1);
    }

    #[tokio::test]
    async fn validation_happens_before_backend() {
        let backend = CountingBackend::new(Ok(POSITIVE));
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), QuotaGuard::new(15));
        let err = orchestrator.analyze("1234").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.quota_state().used, 0);
    }

    #[tokio::test]
    async fn wrong_payload_kind_degrades() {
        let mood = r#"{"quote": "q", "playlist": {"name": "n", "url": "u"}}"#;
        let orchestrator = AnalysisOrchestrator::new(CountingBackend::new(Ok(mood)), QuotaGuard::new(15));
        let result = orchestrator.analyze("I love this!").await.unwrap();
        assert_eq!(result.provenance, Provenance::Fallback);
    }

    #[tokio::test]
    async fn mood_default_when_offline() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(UnavailableBackend), QuotaGuard::new(15));
        let mood = orchestrator
            .mood_enhancement(SentimentLabel::Negative, "gloomy")
            .await;
        assert_eq!(mood, MoodEnhancement::default_for(SentimentLabel::Negative));
        assert_eq!(orchestrator.quota_state().used, 0);
    }

    #[tokio::test]
    async fn analyze_with_mood_omits_failed_suggestion() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(UnavailableBackend), QuotaGuard::new(15));
        let enhanced = orchestrator.analyze_with_mood("I love this!").await.unwrap();
        assert!(enhanced.mood.is_none());
        assert_eq!(enhanced.result.provenance, Provenance::Fallback);
    }

    #[tokio::test]
    async fn analyze_with_mood_attaches_suggestion() {
        let backend = RoutedBackend::new();
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), QuotaGuard::new(15));
        let enhanced = orchestrator.analyze_with_mood("sunny day").await.unwrap();

        assert_eq!(enhanced.result.provenance, Provenance::Backend);
        let mood = enhanced.mood.expect("mood suggestion");
        assert_eq!(mood.quote, "Keep going.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.quota_state().used, 1);
    }

    #[test]
    fn batch_cap_is_at_least_one() {
        let orchestrator =
            AnalysisOrchestrator::new(Arc::new(UnavailableBackend), QuotaGuard::new(15)).with_max_batch(0);
        assert_eq!(orchestrator.max_batch(), 1);
    }

    #[test]
    fn batch_cap_is_clamped_to_upper_bound() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(UnavailableBackend), QuotaGuard::new(15))
            .with_max_batch(usize::MAX);
        assert_eq!(orchestrator.max_batch(), MAX_BATCH_ITEMS);
        assert_eq!(units(usize::MAX), u32::MAX);
    }
}
