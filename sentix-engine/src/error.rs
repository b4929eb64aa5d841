//! Error taxonomy for the analysis layer.
//!
//! - [`InputError`]: the caller's text is unusable; nothing reaches the backend.
//! - [`AnalysisError::QuotaExceeded`]: the session allowance is spent.
//! - [`BackendFailure`]: the remote backend failed or returned something
//!   outside the output contract. Single-text analysis recovers from it.
//! - [`AnalysisError::UnsupportedOperation`]: a backend failure on an
//!   operation that has no local substitute (comparison, deeper analysis).

use std::fmt;
use thiserror::Error;

/// Category of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Could not reach the backend (DNS, connect, timeout)
    Transport,
    /// Credential rejected
    Auth,
    /// Backend-side rate limit
    RateLimited,
    /// Any other non-success response
    Api,
    /// Response body was not the JSON document we asked for
    MalformedOutput,
    /// JSON parsed but broke the output contract
    ContractViolation,
    /// No backend configured
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transport => "transport error",
            Self::Auth => "authentication failed",
            Self::RateLimited => "rate limited",
            Self::Api => "API error",
            Self::MalformedOutput => "malformed output",
            Self::ContractViolation => "contract violation",
            Self::Unavailable => "backend unavailable",
        };
        f.write_str(s)
    }
}

/// Failure of a single backend invocation.
#[derive(Debug, Clone, Error)]
#[error("[{backend}] {kind}: {message}")]
pub struct BackendFailure {
    pub backend: String,
    pub kind: FailureKind,
    pub message: String,
    pub status_code: Option<u16>,
}

impl BackendFailure {
    pub fn new(backend: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(backend: impl Into<String>, status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => FailureKind::Auth,
            429 => FailureKind::RateLimited,
            _ => FailureKind::Api,
        };
        Self {
            backend: backend.into(),
            kind,
            message: format!("HTTP {}: {}", status, body.trim()),
            status_code: Some(status),
        }
    }

    pub fn contract(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(backend, FailureKind::ContractViolation, message)
    }
}

/// Which input text a validation problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSubject {
    Single,
    /// Zero-based position within a batch
    Index(usize),
    A,
    B,
}

impl fmt::Display for TextSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("Text"),
            Self::Index(i) => write!(f, "Text #{}", i + 1),
            Self::A => f.write_str("Text A"),
            Self::B => f.write_str("Text B"),
        }
    }
}

/// Rejected input text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{subject} must contain at least one letter")]
    NoLetters { subject: TextSubject },

    #[error("{subject} contains {found:?}; remove any . ' \" characters and try again")]
    ForbiddenCharacter { subject: TextSubject, found: char },

    #[error("At least one text is required")]
    Empty,
}

impl InputError {
    pub fn subject(&self) -> Option<TextSubject> {
        match self {
            Self::NoLetters { subject } | Self::ForbiddenCharacter { subject, .. } => {
                Some(*subject)
            }
            Self::Empty => None,
        }
    }
}

/// Terminal failure of an orchestrated request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(#[from] InputError),

    #[error(
        "Analysis limit reached: {requested} requested but only {remaining} remaining this session"
    )]
    QuotaExceeded { requested: u32, remaining: u32 },

    #[error("{operation} is unavailable right now ({source}); please try again")]
    UnsupportedOperation {
        operation: &'static str,
        #[source]
        source: BackendFailure,
    },
}

impl AnalysisError {
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}
