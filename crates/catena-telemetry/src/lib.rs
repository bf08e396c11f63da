//! Observability setup for Catena.
//!
//! - **Logging**: `tracing-subscriber` registry with JSON or pretty output
//! - **Metrics**: names and descriptions of the counters chains record
//!
//! # Example
//!
//! ```rust,ignore
//! use catena_config::ConfigLoader;
//! use catena_telemetry::{init_logging, LogConfig};
//!
//! let config = ConfigLoader::new().with_default_env().load()?;
//! init_logging(&LogConfig::from(&config.logging))?;
//! ```

#![doc(html_root_url = "https://docs.rs/catena-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use metrics::describe_metrics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
