//! Generative backend abstraction.
//!
//! A backend takes a prompt plus a response schema and returns the raw text
//! it generated. Parsing and contract checks happen in the client.

mod gemini;

pub use gemini::GeminiBackend;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BackendFailure, FailureKind};

/// Text generation with a constrained response schema.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Backend name used in logs and failures.
    fn name(&self) -> &str;

    /// Generate a response for `prompt`, asking for JSON shaped like `schema`.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, BackendFailure>;
}

/// Backend that is never reachable.
///
/// Used for offline operation: every single-text analysis degrades to the
/// local classifier.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend;

#[async_trait]
impl GenerativeBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, BackendFailure> {
        Err(BackendFailure::new(
            self.name(),
            FailureKind::Unavailable,
            "no generative backend configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_backend_always_fails() {
        let backend = UnavailableBackend;
        let err = tokio_test::block_on(backend.generate("anything", &serde_json::json!({})))
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Unavailable);
        assert_eq!(err.backend, "offline");
    }
}
