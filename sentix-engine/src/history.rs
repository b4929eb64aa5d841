//! In-memory record of completed analyses, newest first.

use std::collections::BTreeMap;

use crate::types::{AnalysisResult, Provenance, SentimentLabel};

#[derive(Debug, Clone, Default)]
pub struct AnalysisHistory {
    entries: Vec<AnalysisResult>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: AnalysisResult) {
        self.entries.insert(0, result);
    }

    /// Prepend a batch as one block, keeping its input order.
    pub fn record_batch(&mut self, results: impl IntoIterator<Item = AnalysisResult>) {
        let mut block: Vec<AnalysisResult> = results.into_iter().collect();
        block.append(&mut self.entries);
        self.entries = block;
    }

    pub fn entries(&self) -> &[AnalysisResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of results per label. Every label is present.
    pub fn distribution(&self) -> BTreeMap<SentimentLabel, usize> {
        let mut counts: BTreeMap<SentimentLabel, usize> =
            SentimentLabel::ALL.iter().map(|l| (*l, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.label).or_insert(0) += 1;
        }
        counts
    }

    /// Fraction of results produced by the local fallback.
    pub fn fallback_share(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let fallback = self
            .entries
            .iter()
            .filter(|e| e.provenance == Provenance::Fallback)
            .count();
        fallback as f64 / self.entries.len() as f64
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
