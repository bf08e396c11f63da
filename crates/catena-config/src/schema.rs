//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Level names accepted by `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("expected 'json' or 'pretty', found '{other}'")),
        }
    }
}

/// Logging configuration section.
///
/// # Example
///
/// ```
/// use catena_config::{LogFormat, LoggingSection};
///
/// let logging = LoggingSection::default();
/// assert_eq!(logging.level, "info");
/// assert_eq!(logging.format, LogFormat::Json);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable log output.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Default level filter (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Service name attached to every log line.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            service_name: default_service_name(),
        }
    }
}

/// Pipeline configuration section.
///
/// Controls the default response every chain starts from and the result of
/// the default error handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Status code of the default response.
    #[serde(default = "default_success_status")]
    pub success_status: u16,

    /// Message of the default response body.
    #[serde(default = "default_success_message")]
    pub success_message: String,

    /// Value of the `Access-Control-Allow-Origin` header.
    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,

    /// Message of the default error handler's body.
    #[serde(default = "default_internal_error_message")]
    pub internal_error_message: String,

    /// Include stage error details in default error handler responses.
    /// Development only.
    #[serde(default)]
    pub expose_internal_errors: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            success_status: default_success_status(),
            success_message: default_success_message(),
            cors_allow_origin: default_cors_allow_origin(),
            internal_error_message: default_internal_error_message(),
            expose_internal_errors: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "catena".to_string()
}

fn default_success_status() -> u16 {
    200
}

fn default_success_message() -> String {
    "Success".to_string()
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

fn default_internal_error_message() -> String {
    "Internal Server Error".to_string()
}
