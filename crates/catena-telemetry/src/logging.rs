//! Structured logging for Catena.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a JSON
//! or pretty `fmt` layer. Every Catena crate logs through `tracing`, so once
//! [`init_logging`] has run, stage failures, recoveries and run summaries
//! show up with the field names listed in [`fields`].
//!
//! # Example
//!
//! ```rust,ignore
//! use catena_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().service_name("accounts"))?;
//!
//! tracing::info!(stage = "validator", "stage entered");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use catena_config::{LogFormat, LoggingSection};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g. `"info"` or `"catena_middleware=debug,info"`).
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to log span open and close events.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Service name logged once logging is up.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            service_name: "catena".to_string(),
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        let base = match section.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };

        Self {
            enabled: section.enabled,
            level: section.level.to_lowercase(),
            service_name: section.service_name.clone(),
            ..base
        }
    }
}

/// Initializes the logging subsystem.
///
/// Logs are written to stderr. Does nothing when `config.enabled` is
/// `false`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for an empty level and
/// `TelemetryError::LoggingInit` if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.level.trim().is_empty() {
        return Err(TelemetryError::InvalidConfig("log level is empty".to_string()));
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_writer(std::io::stderr)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_writer(std::io::stderr)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::debug!(service.name = %config.service_name, level = %config.level, "logging initialized");

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the directives are invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

/// Standard log field names used across Catena.
pub mod fields {
    /// Name of the stage being run.
    pub const STAGE: &str = "stage";

    /// Code of a stage error.
    pub const ERROR_CODE: &str = "error.code";

    /// Kind of a stage error.
    pub const ERROR_KIND: &str = "error.kind";

    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Service name field name.
    pub const SERVICE_NAME: &str = "service.name";
}
