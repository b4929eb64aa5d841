//! Configuration management for Sentix.
//!
//! Settings live in an optional JSON file at `~/.sentix/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SENTIX_CONFIG` → path of the config file
//! - `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) → backend.api_key
//! - `SENTIX_MODEL` → backend.model
//! - `SENTIX_BACKEND_URL` → backend.base_url
//! - `SENTIX_QUOTA_LIMIT` → quota.limit
//! - `SENTIX_LOG_LEVEL` → observability.log_level
//! - `SENTIX_LOG_FORMAT` → observability.log_format
//!
//! The API key is only ever read from the environment and is never written
//! back to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::validation::{ValidationError, ValidationResult};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".sentix"),
        |dirs| dirs.home_dir().join(".sentix"),
    )
}

/// Get the configuration file path, honoring `SENTIX_CONFIG`.
pub fn config_path() -> PathBuf {
    match std::env::var("SENTIX_CONFIG") {
        Ok(path) if !path.is_empty() => PathBuf::from(shellexpand::tilde(&path).into_owned()),
        _ => config_dir().join("config.json"),
    }
}

// ============================================================================
// Backend Configuration
// ============================================================================

/// Remote generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API key (environment only)
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_timeout_secs() -> u64 {
    60
}

// ============================================================================
// Quota / Batch Configuration
// ============================================================================

/// Session-wide analysis quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of chargeable analyses per process lifetime
    #[serde(default = "default_quota_limit")]
    pub limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: default_quota_limit(),
        }
    }
}

fn default_quota_limit() -> u32 {
    15
}

/// Upper bound on `batch.max_items`.
pub const MAX_BATCH_ITEMS: usize = 100;

/// Batch fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Items beyond this count are dropped from a batch
    #[serde(default = "default_batch_max_items")]
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_items: default_batch_max_items(),
        }
    }
}

fn default_batch_max_items() -> usize {
    10
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> ValidationResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Every parsable override is applied; an unparsable numeric value is
    /// reported after the rest have been applied.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ValidationResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.backend.api_key = Some(key);
        }

        if let Some(model) = non_empty("SENTIX_MODEL") {
            self.backend.model = model;
        }

        if let Some(url) = non_empty("SENTIX_BACKEND_URL") {
            self.backend.base_url = url.trim_end_matches('/').to_string();
        }

        let mut bad_limit = None;
        if let Some(limit) = non_empty("SENTIX_QUOTA_LIMIT") {
            match limit.trim().parse() {
                Ok(l) => self.quota.limit = l,
                Err(_) => bad_limit = Some(limit),
            }
        }

        if let Some(level) = non_empty("SENTIX_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Some(format) = non_empty("SENTIX_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        match bad_limit {
            Some(value) => Err(ValidationError::InvalidValue {
                field: "SENTIX_QUOTA_LIMIT".into(),
                reason: format!("'{}' is not a whole number", value),
            }),
            None => Ok(()),
        }
    }

    /// The backend API key, or a configuration error if none was supplied.
    pub fn require_api_key(&self) -> crate::error::Result<&str> {
        self.backend
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "backend API key not set; export GEMINI_API_KEY (or GOOGLE_API_KEY)".into(),
                )
            })
    }
}
