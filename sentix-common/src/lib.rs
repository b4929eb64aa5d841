//! Sentix Common - Shared configuration, error types, and logging for Sentix.
//!
//! This crate provides:
//! - Configuration types and loading (file + environment)
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup and structured tracing helpers

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    BackendConfig, BatchConfig, Config, ObservabilityConfig, QuotaConfig, MAX_BATCH_ITEMS,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
