//! # Catena Config
//!
//! Typed, layered configuration for Catena pipelines.
//!
//! Configuration is loaded in layers, later layers overriding earlier ones:
//!
//! 1. Built-in defaults (or the `development`/`production` presets)
//! 2. A TOML or JSON file
//! 3. `CATENA__SECTION__KEY` environment variables
//!
//! Unknown fields are rejected so typos surface at startup.
//!
//! ## File format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//! service_name = "accounts"
//!
//! [pipeline]
//! success_status = 200
//! success_message = "Success"
//! cors_allow_origin = "*"
//! ```
//!
//! ## Example
//!
//! ```
//! use catena_config::{CatenaConfig, ConfigLoader};
//!
//! let config = ConfigLoader::new()
//!     .with_string("[logging]\nservice_name = \"accounts\"", "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.logging.service_name, "accounts");
//! assert_eq!(config.pipeline, CatenaConfig::default().pipeline);
//! ```

#![doc(html_root_url = "https://docs.rs/catena-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CatenaConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LogFormat, LoggingSection, PipelineSection, LOG_LEVELS};
