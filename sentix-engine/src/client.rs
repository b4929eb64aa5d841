//! Structured request execution.
//!
//! Sends a [`RequestDescriptor`] to the backend, recovers the JSON document
//! from the raw reply and checks it against the output contract. Exactly one
//! backend call per invocation; there are no retries.

use std::sync::Arc;

use crate::backend::GenerativeBackend;
use crate::contract::{self, ContractError, ParsedPayload};
use crate::error::{BackendFailure, FailureKind};
use crate::prompt::RequestDescriptor;

/// Contract-checked client over a [`GenerativeBackend`].
#[derive(Clone)]
pub struct StructuredClient {
    backend: Arc<dyn GenerativeBackend>,
}

impl StructuredClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn invoke(&self, request: &RequestDescriptor) -> Result<ParsedPayload, BackendFailure> {
        let raw = self.backend.generate(&request.prompt, &request.schema).await?;

        let json = extract_json(&raw).ok_or_else(|| {
            BackendFailure::new(
                self.backend.name(),
                FailureKind::MalformedOutput,
                "Could not find JSON in response",
            )
        })?;

        contract::parse(request.kind, json).map_err(|e| match e {
            ContractError::Malformed(m) => {
                BackendFailure::new(self.backend.name(), FailureKind::MalformedOutput, m)
            }
            ContractError::Violation(m) => BackendFailure::contract(self.backend.name(), m),
        })
    }
}

/// Locate the JSON object in a model reply.
///
/// Accepts a bare object, one inside a Markdown code fence, or one
/// surrounded by prose.
pub fn extract_json(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    // Fenced block first
    for fence in ["```json", "```"] {
        if let Some(start) = content.find(fence) {
            let start = start + fence.len();
            if let Some(end) = content[start..].find("```") {
                let inner = content[start..start + end].trim();
                if inner.starts_with('{') {
                    return Some(inner);
                }
            }
        }
    }

    // Outermost balanced object, ignoring braces inside strings
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in content[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
