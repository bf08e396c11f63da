//! Main configuration types.
//!
//! This module provides the top-level [`CatenaConfig`] struct and its
//! presets.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingSection, PipelineSection, LOG_LEVELS};

/// Complete Catena configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use catena_config::CatenaConfig;
///
/// let config = CatenaConfig::default();
/// assert_eq!(config.pipeline.success_status, 200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CatenaConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Pipeline defaults.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

impl CatenaConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `pipeline.success_status` is not a 2xx status
    /// - `logging.level` is not a known level name
    /// - `pipeline.cors_allow_origin` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(200..=299).contains(&self.pipeline.success_status) {
            return Err(ConfigError::invalid_value(
                "pipeline.success_status",
                format!("must be a 2xx status, found {}", self.pipeline.success_status),
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "expected one of {}, found '{}'",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            ));
        }

        if self.pipeline.cors_allow_origin.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "pipeline.cors_allow_origin",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting
    /// - Debug log level
    /// - Stage error details in default error responses
    ///
    /// # Example
    ///
    /// ```
    /// use catena_config::CatenaConfig;
    ///
    /// let config = CatenaConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.pipeline.expose_internal_errors);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.pipeline.expose_internal_errors = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting
    /// - Info log level
    /// - Generic default error responses
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.pipeline.expose_internal_errors = false;
        config
    }
}
