//! Configuration validation for Sentix.
//!
//! Checks that configured values are present and within valid ranges
//! before any service is constructed from them.

use thiserror::Error;

use crate::config::{
    BackendConfig, BatchConfig, Config, ObservabilityConfig, QuotaConfig, MAX_BATCH_ITEMS,
};
use crate::error;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.backend.validate(),
            self.quota.validate(),
            self.batch.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Config {
    /// Load configuration with env overrides and validate it.
    ///
    /// Every failure is a configuration error.
    pub fn load_and_validate() -> error::Result<Self> {
        let config = Self::load_with_env().map_err(|e| {
            error::Error::Config(format!("{:#}", e)).with_context("Failed to load configuration")
        })?;
        config
            .validate()
            .map_err(|e| error::Error::Config(e.to_string()).with_context("Invalid configuration"))?;
        Ok(config)
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "backend.model".into(),
            });
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidValue {
                field: "backend.base_url".into(),
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidValue {
                field: "backend.temperature".into(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "backend.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for QuotaConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.limit == 0 {
            return Err(ValidationError::InvalidValue {
                field: "quota.limit".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !(1..=MAX_BATCH_ITEMS).contains(&self.max_items) {
            return Err(ValidationError::InvalidValue {
                field: "batch.max_items".into(),
                reason: format!("must be between 1 and {}", MAX_BATCH_ITEMS),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("expected one of {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test_case(0 => false ; "zero limit")]
    #[test_case(1 => true ; "single unit")]
    #[test_case(15 => true ; "default limit")]
    fn test_quota_limit(limit: u32) -> bool {
        QuotaConfig { limit }.validate().is_ok()
    }

    #[test_case(0 => false ; "empty batch")]
    #[test_case(10 => true ; "default batch")]
    #[test_case(101 => false ; "oversized batch")]
    fn test_batch_max_items(max_items: usize) -> bool {
        BatchConfig { max_items }.validate().is_ok()
    }

    #[test]
    fn test_backend_rejects_bad_url() {
        let backend = BackendConfig {
            base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(matches!(
            backend.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "backend.base_url"
        ));
    }

    #[test]
    fn test_backend_rejects_empty_model() {
        let backend = BackendConfig {
            model: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            backend.validate(),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_multiple_errors_aggregated() {
        let mut config = Config::default();
        config.quota.limit = 0;
        config.observability.log_format = "xml".into();

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {:?}", other),
        }
    }

    #[test]
    fn test_load_and_validate_reports_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch": {"max_items": 500}}"#).unwrap();
        std::env::set_var("SENTIX_CONFIG", &path);

        let err = Config::load_and_validate().unwrap_err();
        std::env::remove_var("SENTIX_CONFIG");

        assert!(err.is_config());
        assert_eq!(err.exit_code(), 78);
        assert!(err.to_string().starts_with("Invalid configuration"));
        assert!(err.to_string().contains("batch.max_items"));
    }
}
